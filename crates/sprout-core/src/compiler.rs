//! Invoking the external toolchain on the staged configuration script.
//!
//! The compiler's stdout and stderr are inherited, so diagnostics reach the
//! user's terminal as they are produced. The exit code is logged but not
//! interpreted: the caller decides success by whether a loadable artifact
//! exists afterwards.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{ConfigError, Result};
use crate::paths;
use crate::settings::{CompilerSettings, Profile};
use crate::workspace::Workspace;

#[async_trait]
pub trait Compiler: Send + Sync {
    /// Where `compile` leaves its output for this workspace. Deterministic,
    /// so staleness can be judged before compiling.
    fn artifact_path(&self, workspace: &Workspace) -> PathBuf;

    /// Build `staged` inside `workspace` and return [`Self::artifact_path`].
    ///
    /// Fails only when the toolchain cannot be started at all.
    async fn compile(&self, staged: &Path, workspace: &Workspace) -> Result<PathBuf>;
}

/// Builds the staged script as a `cdylib` with `cargo build`.
#[derive(Debug, Clone)]
pub struct CargoCompiler {
    settings: CompilerSettings,
}

impl CargoCompiler {
    pub fn new(settings: CompilerSettings) -> Self {
        Self { settings }
    }

    fn build_command(&self, program: &Path, workspace: &Workspace) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("build").arg("--lib");
        if self.settings.profile == Profile::Release {
            cmd.arg("--release");
        }
        cmd.arg("--manifest-path")
            .arg(workspace.manifest_path())
            .arg("--target-dir")
            .arg(workspace.target_dir())
            .args(&self.settings.extra_args)
            .current_dir(workspace.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Compiler for CargoCompiler {
    fn artifact_path(&self, workspace: &Workspace) -> PathBuf {
        workspace
            .target_dir()
            .join(self.settings.profile.target_subdir())
            .join(paths::artifact_file_name())
    }

    async fn compile(&self, staged: &Path, workspace: &Workspace) -> Result<PathBuf> {
        let program = which::which(&self.settings.program).map_err(|e| {
            ConfigError::CompilerSpawn {
                program: self.settings.program.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(
            compiler = %program.display(),
            source = %staged.display(),
            "compiling configuration"
        );

        let status = self
            .build_command(&program, workspace)
            .status()
            .await
            .map_err(|e| ConfigError::CompilerSpawn {
                program: program.display().to_string(),
                reason: e.to_string(),
            })?;

        if status.success() {
            tracing::debug!(%status, "compiler finished");
        } else {
            tracing::warn!(%status, "compiler reported errors");
        }

        Ok(self.artifact_path(workspace))
    }
}
