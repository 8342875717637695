use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment setup failed ({step}) at {path}: {source}")]
    Environment {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("home directory not found: set HOME or SPROUT_HOME")]
    HomeNotFound,

    #[error("configuration source not found at {0}: run 'sprout init'")]
    SourceMissing(PathBuf),

    #[error("invalid settings in {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid environment file {path}: {source}")]
    DotEnv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("failed to launch compiler '{program}': {reason}")]
    CompilerSpawn { program: String, reason: String },

    #[error("compilation did not produce a loadable config at {artifact}: {reason}")]
    Compile { artifact: PathBuf, reason: String },

    #[error("compiled config {artifact} is malformed: {reason}")]
    Shape { artifact: PathBuf, reason: String },

    #[error("failed to persist fingerprint to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no {0} configured: add one in sprout.config.rs")]
    MissingCollaborator(String),

    #[error(transparent)]
    Collaborator(#[from] sprout_sdk::CollaboratorError),
}

impl ConfigError {
    pub(crate) fn env(step: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Environment {
            step,
            path: path.into(),
            source,
        }
    }

    /// Coarse failure class, stable for logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::Environment { .. }
            | ConfigError::HomeNotFound
            | ConfigError::SourceMissing(_)
            | ConfigError::Settings { .. }
            | ConfigError::DotEnv { .. } => "environment",
            ConfigError::CompilerSpawn { .. } | ConfigError::Compile { .. } => "compile",
            ConfigError::Shape { .. } => "shape",
            ConfigError::Persistence { .. } => "persistence",
            ConfigError::MissingCollaborator(_) | ConfigError::Collaborator(_) => "collaborator",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
