use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

// ---------------------------------------------------------------------------
// Project layout
// ---------------------------------------------------------------------------

pub const SPROUT_DIR: &str = ".sprout";
pub const SETTINGS_FILE: &str = ".sprout/config.yaml";
pub const DEFAULT_CONFIG_FILE: &str = "sprout.config.rs";
pub const DEFAULT_DEPENDENCY_DIR: &str = "vendor";

// ---------------------------------------------------------------------------
// Workspace layout
// ---------------------------------------------------------------------------

pub const WORKSPACES_DIR: &str = "workspaces";
pub const STAGED_SOURCE: &str = "sprout.config.rs";
pub const DEPENDENCY_LINK: &str = "deps";
pub const CARGO_MANIFEST: &str = "Cargo.toml";
pub const CARGO_CONFIG: &str = ".cargo/config.toml";
pub const TARGET_DIR: &str = "target";
pub const FINGERPRINT_FILE: &str = "config.fingerprint";

/// Library name of the compiled configuration crate.
pub const ARTIFACT_CRATE: &str = "sprout_config";

pub const SPROUT_HOME_ENV: &str = "SPROUT_HOME";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn sprout_dir(root: &Path) -> PathBuf {
    root.join(SPROUT_DIR)
}

/// `root` made absolute against the current directory, so links and
/// paths derived from it stay valid from inside the workspace.
pub fn absolute(root: &Path) -> Result<PathBuf> {
    std::path::absolute(root).map_err(|e| ConfigError::env("resolve project root", root, e))
}

/// `$SPROUT_HOME`, else `~/.sprout`.
pub fn sprout_home() -> Result<PathBuf> {
    sprout_home_from(std::env::var_os(SPROUT_HOME_ENV))
}

fn sprout_home_from(env: Option<OsString>) -> Result<PathBuf> {
    if let Some(dir) = env.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    home::home_dir()
        .map(|h| h.join(SPROUT_DIR))
        .ok_or(ConfigError::HomeNotFound)
}

/// Platform file name of the compiled config library,
/// e.g. `libsprout_config.so` or `sprout_config.dll`.
pub fn artifact_file_name() -> String {
    format!(
        "{}{}{}",
        std::env::consts::DLL_PREFIX,
        ARTIFACT_CRATE,
        std::env::consts::DLL_SUFFIX
    )
}

/// Directory name for a project's workspace: `<name>-<16 hex digits>`.
///
/// The hash covers the canonical project path so two checkouts with the same
/// directory name never share a workspace; the name prefix only helps humans
/// find their way around `~/.sprout/workspaces`.
pub fn workspace_key(project_root: &Path) -> String {
    let canonical = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf());
    let hash = xxhash_rust::xxh3::xxh3_64(canonical.as_os_str().as_encoded_bytes());

    let name: String = canonical
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let name = name.trim_matches('-');
    let name = if name.is_empty() { "project" } else { name };

    format!("{name}-{hash:016x}")
}
