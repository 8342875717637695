//! Project-level settings for the config pipeline (`.sprout/config.yaml`).
//!
//! Everything here has a default, so a project without a settings file works
//! out of the box. The settings describe *how* to build the configuration
//! script; the collaborators themselves live in the script.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::paths;

pub const CARGO_ENV: &str = "SPROUT_CARGO";

// ---------------------------------------------------------------------------
// CompilerSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    Release,
    Debug,
}

impl Profile {
    /// Directory under `target/` cargo writes this profile's output to.
    pub fn target_subdir(&self) -> &'static str {
        match self {
            Profile::Release => "release",
            Profile::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerSettings {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default)]
    pub profile: Profile,
    /// Appended verbatim to the build command.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_program() -> String {
    "cargo".to_string()
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            profile: Profile::default(),
            extra_args: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Configuration script, relative to the project root.
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,
    /// Directory holding the crates the script depends on (`cargo vendor`
    /// output), relative to the project root.
    #[serde(default = "default_dependency_dir")]
    pub dependency_dir: PathBuf,
    /// Where per-project workspaces live. Defaults to `$SPROUT_HOME/workspaces`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
    #[serde(default)]
    pub compiler: CompilerSettings,
}

fn default_config_file() -> PathBuf {
    PathBuf::from(paths::DEFAULT_CONFIG_FILE)
}

fn default_dependency_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DEPENDENCY_DIR)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            dependency_dir: default_dependency_dir(),
            workspace_root: None,
            compiler: CompilerSettings::default(),
        }
    }
}

impl Settings {
    /// Load `.sprout/config.yaml` under `root`, falling back to defaults when
    /// the file does not exist. Environment overrides are applied last.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::settings_path(root);
        let mut settings = match std::fs::read_to_string(&path) {
            Ok(data) => serde_yaml::from_str::<Settings>(&data)
                .map_err(|source| ConfigError::Settings {
                    path: path.clone(),
                    source,
                })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(ConfigError::env("read settings", path, e)),
        };
        settings.apply_env_overrides(std::env::var(CARGO_ENV).ok());
        Ok(settings)
    }

    fn apply_env_overrides(&mut self, cargo: Option<String>) {
        if let Some(program) = cargo.filter(|p| !p.trim().is_empty()) {
            tracing::debug!(program = %program, "compiler overridden by {CARGO_ENV}");
            self.compiler.program = program;
        }
    }

    pub fn config_path(&self, root: &Path) -> PathBuf {
        root.join(&self.config_file)
    }

    pub fn dependency_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dependency_dir)
    }

    pub fn workspace_root(&self) -> Result<PathBuf> {
        match &self.workspace_root {
            Some(dir) => Ok(dir.clone()),
            None => Ok(paths::sprout_home()?.join(paths::WORKSPACES_DIR)),
        }
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
