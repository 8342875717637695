//! Per-project build directory for the configuration script.
//!
//! ```text
//! ~/.sprout/workspaces/<name>-<hash>/
//!   sprout.config.rs     staged copy of the project's script (always fresh)
//!   deps -> <project>/vendor
//!   Cargo.toml           written once, never overwritten
//!   .cargo/config.toml   written once, never overwritten
//!   target/              cargo output, holds the compiled artifact
//!   config.fingerprint   fingerprint of the source the artifact came from
//! ```
//!
//! Every mutating step is gated by an existence check, so `ensure*` is safe to
//! call on every run. Two processes racing on the same project may both try
//! to create the link or descriptors; that usage is not supported.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::fingerprint::ConfigurationSource;
use crate::fingerprint_store::FingerprintStore;
use crate::io;
use crate::paths;
use crate::settings::Settings;

const GENERATED_HEADER: &str =
    "# Generated by sprout. Edit freely: sprout never overwrites this file.\n";

fn cargo_manifest() -> String {
    format!(
        r#"{GENERATED_HEADER}
[package]
name = "sprout-config"
version = "0.0.0"
edition = "2021"
publish = false

[lib]
name = "{crate_name}"
path = "{staged}"
crate-type = ["cdylib"]

# sprout-sdk must match the sprout release that loads the library.
[dependencies]
sprout-sdk = "={sdk_version}"

# Keep the staged crate out of any enclosing cargo workspace.
[workspace]
"#,
        crate_name = paths::ARTIFACT_CRATE,
        staged = paths::STAGED_SOURCE,
        sdk_version = sprout_sdk::SDK_VERSION,
    )
}

fn cargo_config() -> String {
    format!(
        r#"{GENERATED_HEADER}
# Resolve registry dependencies from the project's vendored sources.
[source.crates-io]
replace-with = "vendored-sources"

[source.vendored-sources]
directory = "{deps}"
"#,
        deps = paths::DEPENDENCY_LINK,
    )
}

#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
    dependency_target: PathBuf,
    store: FingerprintStore,
}

impl Workspace {
    /// Resolve the workspace directory for `project_root` without touching
    /// the filesystem. A relative root is taken against the current
    /// directory.
    pub fn locate(project_root: &Path, settings: &Settings) -> Result<Self> {
        let project_root = paths::absolute(project_root)?;
        let dir = settings
            .workspace_root()?
            .join(paths::workspace_key(&project_root));
        Ok(Self {
            store: FingerprintStore::new(&dir),
            dependency_target: settings.dependency_path(&project_root),
            dir,
        })
    }

    /// Resolve and create the workspace directory (idempotent).
    pub fn ensure(project_root: &Path, settings: &Settings) -> Result<Self> {
        let ws = Self::locate(project_root, settings)?;
        std::fs::create_dir_all(&ws.dir)
            .map_err(|e| ConfigError::env("create workspace", &ws.dir, e))?;
        tracing::debug!(dir = %ws.dir.display(), "workspace ready");
        Ok(ws)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    pub fn staged_source_path(&self) -> PathBuf {
        self.dir.join(paths::STAGED_SOURCE)
    }

    pub fn dependency_link_path(&self) -> PathBuf {
        self.dir.join(paths::DEPENDENCY_LINK)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(paths::CARGO_MANIFEST)
    }

    pub fn target_dir(&self) -> PathBuf {
        self.dir.join(paths::TARGET_DIR)
    }

    pub fn fingerprint_store(&self) -> &FingerprintStore {
        &self.store
    }

    /// Link `deps` to the project's dependency directory. Returns true if the
    /// link was created by this call.
    ///
    /// Any existing entry, even a dangling link, is left alone. The target
    /// itself may not exist yet.
    pub fn ensure_dependency_link(&self) -> Result<bool> {
        let link = self.dependency_link_path();
        if link.symlink_metadata().is_ok() {
            return Ok(false);
        }
        symlink_dir(&self.dependency_target, &link)
            .map_err(|e| ConfigError::env("link dependencies", &link, e))?;
        tracing::debug!(
            link = %link.display(),
            target = %self.dependency_target.display(),
            "dependency link created"
        );
        Ok(true)
    }

    /// Write the cargo descriptors that are missing. Returns how many were
    /// written; existing descriptors are never overwritten.
    pub fn ensure_toolchain_descriptors(&self) -> Result<usize> {
        let descriptors = [
            (paths::CARGO_MANIFEST, cargo_manifest()),
            (paths::CARGO_CONFIG, cargo_config()),
        ];
        let mut written = 0;
        for (name, content) in descriptors {
            let path = self.dir.join(name);
            if io::write_if_missing(&path, content.as_bytes())
                .map_err(|e| ConfigError::env("write toolchain descriptor", &path, e))?
            {
                tracing::debug!(path = %path.display(), "toolchain descriptor written");
                written += 1;
            }
        }
        Ok(written)
    }

    /// Copy the current source into the workspace, replacing any previous
    /// staged copy.
    pub fn stage_source(&self, source: &ConfigurationSource) -> Result<PathBuf> {
        let staged = self.staged_source_path();
        io::atomic_write(&staged, source.text.as_bytes())
            .map_err(|e| ConfigError::env("stage configuration source", &staged, e))?;
        Ok(staged)
    }

    /// Delete the workspace and everything in it. Returns false if there was
    /// nothing to delete.
    pub fn remove(&self) -> Result<bool> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConfigError::env("remove workspace", &self.dir, e)),
        }
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
