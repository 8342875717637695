//! Turns the project's `sprout.config.rs` into a [`RuntimeConfiguration`].
//!
//! ```text
//! Idle -> Staging -> CacheHit  -> Loading -> Validating -> Ready
//!                 \> Compiling /
//! ```
//!
//! Any failing step moves the loader to `Failed` and rejects the whole load;
//! nothing is stored in the [`ConfigHolder`], so a later `load` starts over.
//! The persisted fingerprint only ever describes an artifact that exists:
//! it is cleared before compiling and written only once the compiler has
//! produced something.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use sprout_sdk::{
    PartialConfig, ABI_SYMBOL, ABI_VERSION, FACTORY_SYMBOL, RUSTC_FINGERPRINT, RUSTC_SYMBOL,
    RUSTC_VERSION,
};

use crate::compiler::{CargoCompiler, Compiler};
use crate::error::{ConfigError, Result};
use crate::fingerprint::{ConfigurationSource, Fingerprint};
use crate::io;
use crate::module::{ConfigModule, DylibLoader, ModuleLoader};
use crate::paths;
use crate::runtime::{ConfigHolder, LoadOrigin, RuntimeConfiguration};
use crate::settings::Settings;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Staging,
    CacheHit,
    Compiling,
    Loading,
    Validating,
    Ready,
    Failed { step: &'static str },
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Staging => "staging",
            LoadState::CacheHit => "cache_hit",
            LoadState::Compiling => "compiling",
            LoadState::Loading => "loading",
            LoadState::Validating => "validating",
            LoadState::Ready => "ready",
            LoadState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Failed { step } => write!(f, "failed ({step})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Cache state of a project's workspace, computed without compiling.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub source: PathBuf,
    pub workspace: PathBuf,
    pub artifact: PathBuf,
    pub fingerprint_file: PathBuf,
    /// Fingerprint of the source as it is now, if it can be read.
    pub current: Option<Fingerprint>,
    /// Fingerprint recorded by the last successful compile.
    pub recorded: Option<Fingerprint>,
    pub artifact_exists: bool,
}

impl CacheStatus {
    /// A `load` right now would reuse the cached build.
    pub fn is_fresh(&self) -> bool {
        self.artifact_exists && self.current.is_some() && self.current == self.recorded
    }
}

pub struct ConfigLoader {
    project_root: PathBuf,
    settings: Settings,
    holder: Arc<ConfigHolder>,
    compiler: Box<dyn Compiler>,
    modules: Box<dyn ModuleLoader>,
    state: Mutex<LoadState>,
}

impl ConfigLoader {
    pub fn new(
        project_root: impl Into<PathBuf>,
        settings: Settings,
        holder: Arc<ConfigHolder>,
        compiler: Box<dyn Compiler>,
        modules: Box<dyn ModuleLoader>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            settings,
            holder,
            compiler,
            modules,
            state: Mutex::new(LoadState::Idle),
        }
    }

    /// A loader that builds with cargo and loads the result as a dynamic
    /// library.
    pub fn from_settings(
        project_root: impl Into<PathBuf>,
        settings: Settings,
        holder: Arc<ConfigHolder>,
    ) -> Self {
        let compiler = CargoCompiler::new(settings.compiler.clone());
        Self::new(
            project_root,
            settings,
            holder,
            Box::new(compiler),
            Box::new(DylibLoader),
        )
    }

    pub fn state(&self) -> LoadState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute path of the configuration script.
    fn source_path(&self) -> Result<PathBuf> {
        let root = paths::absolute(&self.project_root)?;
        Ok(self.settings.config_path(&root))
    }

    fn transition(&self, next: LoadState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let prev = *state;
        tracing::debug!(from = %prev, to = %next, "config loader");
        *state = next;
    }

    /// Load the configuration, compiling only if the source changed since the
    /// last successful build. Once a load succeeds, every later call returns
    /// the same configuration without touching the filesystem.
    pub async fn load(&self) -> Result<Arc<RuntimeConfiguration>> {
        if let Some(config) = self.holder.get() {
            return Ok(config);
        }
        self.holder.get_or_try_init(|| self.run()).await
    }

    async fn run(&self) -> Result<Arc<RuntimeConfiguration>> {
        let result = self.run_steps().await;
        if let Err(e) = &result {
            let step = self.state().as_str();
            tracing::debug!(step, kind = e.kind(), error = %e, "configuration load failed");
            self.transition(LoadState::Failed { step });
        }
        result
    }

    async fn run_steps(&self) -> Result<Arc<RuntimeConfiguration>> {
        self.transition(LoadState::Staging);
        let workspace = Workspace::ensure(&self.project_root, &self.settings)?;
        workspace.ensure_dependency_link()?;
        workspace.ensure_toolchain_descriptors()?;

        let source = ConfigurationSource::read(&self.source_path()?)?;
        let staged = workspace.stage_source(&source)?;
        let fingerprint = source.fingerprint();

        let store = workspace.fingerprint_store();
        let cached = self.compiler.artifact_path(&workspace);
        let fresh = store.read() == Some(fingerprint) && cached.is_file();

        let artifact = if fresh {
            self.transition(LoadState::CacheHit);
            tracing::info!(%fingerprint, "configuration unchanged, reusing build");
            cached
        } else {
            self.transition(LoadState::Compiling);
            store.clear()?;
            io::remove_if_exists(&cached)
                .map_err(|e| ConfigError::env("remove previous artifact", &cached, e))?;

            let artifact = self.compiler.compile(&staged, &workspace).await?;
            if !artifact.is_file() {
                return Err(ConfigError::Compile {
                    artifact,
                    reason: "the compiler produced no artifact; see its output above".into(),
                });
            }
            store.write(&fingerprint)?;
            tracing::info!(%fingerprint, artifact = %artifact.display(), "configuration compiled");
            artifact
        };

        self.transition(LoadState::Loading);
        let module = self.modules.load(&artifact)?;

        self.transition(LoadState::Validating);
        let partial = instantiate(module.as_ref(), &artifact)?;
        let origin = LoadOrigin {
            source: source.path,
            artifact,
            fingerprint,
            recompiled: !fresh,
        };
        let config = RuntimeConfiguration::from_partial(*partial, module, origin);

        self.transition(LoadState::Ready);
        Ok(Arc::new(config))
    }

    /// Report the cache state without creating, compiling or loading anything.
    pub fn inspect(&self) -> Result<CacheStatus> {
        let workspace = Workspace::locate(&self.project_root, &self.settings)?;
        let source = self.source_path()?;
        let current = match ConfigurationSource::read(&source) {
            Ok(src) => Some(src.fingerprint()),
            Err(ConfigError::SourceMissing(_)) => None,
            Err(e) => return Err(e),
        };
        let artifact = self.compiler.artifact_path(&workspace);
        let store = workspace.fingerprint_store();
        Ok(CacheStatus {
            source,
            workspace: workspace.dir().to_path_buf(),
            artifact_exists: artifact.is_file(),
            artifact,
            fingerprint_file: store.path().to_path_buf(),
            current,
            recorded: store.read(),
        })
    }

    /// Forget the recorded fingerprint so the next load recompiles.
    pub fn invalidate(&self) -> Result<()> {
        let workspace = Workspace::locate(&self.project_root, &self.settings)?;
        workspace.fingerprint_store().clear()
    }

    /// Delete the project's workspace. Returns false if there was none.
    pub fn clean(&self) -> Result<bool> {
        Workspace::locate(&self.project_root, &self.settings)?.remove()
    }
}

/// Check the module's exports and run its factory.
fn instantiate(module: &dyn ConfigModule, artifact: &Path) -> Result<Box<PartialConfig>> {
    let shape = |reason: String| ConfigError::Shape {
        artifact: artifact.to_path_buf(),
        reason,
    };

    match module.abi_version() {
        Some(version) if version == ABI_VERSION => {}
        Some(version) => {
            return Err(shape(format!(
                "built against sprout-sdk ABI {version}, expected {ABI_VERSION}; update the vendored sprout-sdk"
            )))
        }
        None => {
            return Err(shape(format!(
                "no {ABI_SYMBOL} marker; export the factory with sprout_sdk::export_config!"
            )))
        }
    }

    match module.rustc_fingerprint() {
        Some(fingerprint) if fingerprint == RUSTC_FINGERPRINT => {}
        Some(_) => {
            return Err(shape(format!(
                "built by a different rustc than this sprout ({RUSTC_VERSION}); point the compiler setting at that toolchain"
            )))
        }
        None => {
            return Err(shape(format!(
                "no {RUSTC_SYMBOL} marker; export the factory with sprout_sdk::export_config!"
            )))
        }
    }

    let factory = module
        .factory()
        .ok_or_else(|| shape(format!("no '{FACTORY_SYMBOL}' factory exported")))?;

    std::panic::catch_unwind(factory)
        .map_err(|payload| shape(format!("factory panicked: {}", panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}
