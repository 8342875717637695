//! `.env` files that feed the process environment before settings are read.
//!
//! The project's `.env` is loaded first, then `$SPROUT_HOME/.env`. Neither
//! overrides a variable that is already set, so the real environment wins
//! over both files and the project file wins over the global one.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::paths;

pub const ENV_FILE: &str = ".env";

/// Load the project and global `.env` files. Missing files are skipped;
/// returns the files that were loaded.
pub fn load_env_files(project_root: &Path) -> Result<Vec<PathBuf>> {
    let mut loaded = Vec::new();
    let project = project_root.join(ENV_FILE);
    if load_file(&project)? {
        loaded.push(project);
    }

    // Resolved after the project file, which may set SPROUT_HOME.
    match paths::sprout_home() {
        Ok(home) => {
            let global = home.join(ENV_FILE);
            if load_file(&global)? {
                loaded.push(global);
            }
        }
        Err(e) => tracing::debug!(error = %e, "no sprout home; skipping global .env"),
    }
    Ok(loaded)
}

fn load_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "environment file loaded");
            Ok(true)
        }
        Err(e) if e.not_found() => Ok(false),
        Err(source) => Err(ConfigError::DotEnv {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn earlier_files_and_real_environment_win() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        std::fs::write(
            project.path().join(ENV_FILE),
            "SPROUT_DOTENV_T1_A=project\nSPROUT_DOTENV_T1_REAL=file\n",
        )
        .unwrap();
        std::fs::write(
            home.path().join(ENV_FILE),
            "SPROUT_DOTENV_T1_A=home\nSPROUT_DOTENV_T1_B=home\n",
        )
        .unwrap();
        std::env::set_var("SPROUT_DOTENV_T1_REAL", "real");

        assert!(load_file(&project.path().join(ENV_FILE)).unwrap());
        assert!(load_file(&home.path().join(ENV_FILE)).unwrap());

        assert_eq!(std::env::var("SPROUT_DOTENV_T1_A").unwrap(), "project");
        assert_eq!(std::env::var("SPROUT_DOTENV_T1_B").unwrap(), "home");
        assert_eq!(std::env::var("SPROUT_DOTENV_T1_REAL").unwrap(), "real");
    }

    #[test]
    fn missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        assert!(!load_file(&dir.path().join(ENV_FILE)).unwrap());
    }

    #[test]
    fn malformed_file_is_environment_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ENV_FILE);
        std::fs::write(&path, "SPROUT_DOTENV_T3='unterminated\n").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::DotEnv { .. }));
        assert_eq!(err.kind(), "environment");
        assert!(err.to_string().contains(".env"));
    }
}
