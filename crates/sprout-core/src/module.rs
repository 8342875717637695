//! Loading a compiled configuration and finding its factory.
//!
//! [`ConfigLoader`](crate::loader::ConfigLoader) only sees the two traits
//! below; the platform dynamic linker is confined to [`DylibLoader`].

use std::path::{Path, PathBuf};

use sprout_sdk::{ConfigFactory, ABI_SYMBOL, FACTORY_SYMBOL, RUSTC_SYMBOL};

use crate::error::{ConfigError, Result};

/// A loaded unit of code that may export a configuration factory.
///
/// Collaborators created by the factory run code owned by the module, so the
/// module must stay alive for as long as they do.
pub trait ConfigModule: Send + Sync {
    /// Value of the exported ABI marker, if the module has one.
    fn abi_version(&self) -> Option<u32>;

    /// Fingerprint of the rustc that built the module, if it exports one.
    fn rustc_fingerprint(&self) -> Option<u64>;

    /// The exported factory, if the module has one.
    fn factory(&self) -> Option<ConfigFactory>;
}

pub trait ModuleLoader: Send + Sync {
    fn load(&self, artifact: &Path) -> Result<Box<dyn ConfigModule>>;
}

// ---------------------------------------------------------------------------
// DylibLoader
// ---------------------------------------------------------------------------

/// Loads `cdylib` artifacts with the platform dynamic linker.
#[derive(Debug, Clone, Copy, Default)]
pub struct DylibLoader;

impl ModuleLoader for DylibLoader {
    fn load(&self, artifact: &Path) -> Result<Box<dyn ConfigModule>> {
        // SAFETY: loading runs the library's initialisers. The artifact was
        // built by us from the user's own configuration script.
        let library = unsafe { libloading::Library::new(artifact) }.map_err(|e| {
            ConfigError::Compile {
                artifact: artifact.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(artifact = %artifact.display(), "configuration module loaded");
        Ok(Box::new(Dylib {
            library,
            path: artifact.to_path_buf(),
        }))
    }
}

struct Dylib {
    library: libloading::Library,
    path: PathBuf,
}

impl ConfigModule for Dylib {
    fn abi_version(&self) -> Option<u32> {
        // SAFETY: `export_config!` declares the symbol as a `u32` static.
        unsafe {
            let marker = self
                .library
                .get::<*const u32>(ABI_SYMBOL.as_bytes())
                .ok()?;
            Some(**marker)
        }
    }

    fn rustc_fingerprint(&self) -> Option<u64> {
        // SAFETY: `export_config!` declares the symbol as a `u64` static.
        unsafe {
            let marker = self
                .library
                .get::<*const u64>(RUSTC_SYMBOL.as_bytes())
                .ok()?;
            Some(**marker)
        }
    }

    fn factory(&self) -> Option<ConfigFactory> {
        // SAFETY: `export_config!` declares the symbol with the
        // `ConfigFactory` signature, and the ABI marker has been checked by
        // the caller. The pointer outlives the `Symbol` but not `self`.
        let factory = unsafe { self.library.get::<ConfigFactory>(FACTORY_SYMBOL.as_bytes()) };
        match factory {
            Ok(symbol) => Some(*symbol),
            Err(e) => {
                tracing::debug!(artifact = %self.path.display(), error = %e, "factory symbol not found");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// StaticModule
// ---------------------------------------------------------------------------

/// A module whose factory is linked into the current binary.
#[derive(Debug, Clone, Copy)]
pub struct StaticModule {
    factory: Option<ConfigFactory>,
    abi_version: Option<u32>,
    rustc_fingerprint: Option<u64>,
}

impl StaticModule {
    pub fn new(factory: ConfigFactory) -> Self {
        Self {
            factory: Some(factory),
            abi_version: Some(sprout_sdk::ABI_VERSION),
            rustc_fingerprint: Some(sprout_sdk::RUSTC_FINGERPRINT),
        }
    }

    /// A module that exports nothing.
    pub fn empty() -> Self {
        Self {
            factory: None,
            abi_version: None,
            rustc_fingerprint: None,
        }
    }

    pub fn with_abi_version(mut self, version: Option<u32>) -> Self {
        self.abi_version = version;
        self
    }

    pub fn with_rustc_fingerprint(mut self, fingerprint: Option<u64>) -> Self {
        self.rustc_fingerprint = fingerprint;
        self
    }
}

impl ConfigModule for StaticModule {
    fn abi_version(&self) -> Option<u32> {
        self.abi_version
    }

    fn rustc_fingerprint(&self) -> Option<u64> {
        self.rustc_fingerprint
    }

    fn factory(&self) -> Option<ConfigFactory> {
        self.factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_sdk::PartialConfig;
    use tempfile::TempDir;

    fn empty_config() -> Box<PartialConfig> {
        Box::new(PartialConfig::new())
    }

    #[test]
    fn missing_artifact_is_compile_error() {
        let dir = TempDir::new().unwrap();
        let err = DylibLoader
            .load(&dir.path().join("libsprout_config.so"))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Compile { .. }));
    }

    #[test]
    fn garbage_artifact_is_compile_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("libsprout_config.so");
        std::fs::write(&path, b"definitely not an object file").unwrap();
        let err = DylibLoader.load(&path).err().unwrap();
        assert_eq!(err.kind(), "compile");
    }

    #[test]
    fn static_module_exports_factory_and_abi() {
        let module = StaticModule::new(empty_config);
        assert_eq!(module.abi_version(), Some(sprout_sdk::ABI_VERSION));
        assert_eq!(module.rustc_fingerprint(), Some(sprout_sdk::RUSTC_FINGERPRINT));
        let factory = module.factory().unwrap();
        assert!(factory().ticket_source.is_none());
    }

    #[test]
    fn empty_module_exports_nothing() {
        let module = StaticModule::empty();
        assert!(module.factory().is_none());
        assert!(module.abi_version().is_none());
        assert!(module.rustc_fingerprint().is_none());
    }
}
