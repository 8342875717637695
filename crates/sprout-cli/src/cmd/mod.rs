pub mod branch;
pub mod config;
pub mod init;
pub mod prompt;
pub mod tasks;

use anyhow::Context;
use sprout_core::{ConfigHolder, ConfigLoader, RuntimeConfiguration, Settings};
use std::path::Path;
use std::sync::Arc;

/// Build a loader for the project at `root` from its `.sprout/config.yaml`,
/// after loading the project and global `.env` files.
pub fn loader(root: &Path) -> anyhow::Result<ConfigLoader> {
    sprout_core::load_env_files(root).context("failed to load environment files")?;
    let settings = Settings::load(root).context("failed to load sprout settings")?;
    Ok(ConfigLoader::from_settings(
        root,
        settings,
        Arc::new(ConfigHolder::new()),
    ))
}

/// Run a full configuration load, compiling if the script changed.
pub fn load(loader: &ConfigLoader) -> anyhow::Result<Arc<RuntimeConfiguration>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(loader.load())
        .with_context(|| format!("failed to load {}", loader.settings().config_file.display()))
}

/// Shorthand for commands that only need the loaded configuration.
pub fn load_config(root: &Path) -> anyhow::Result<Arc<RuntimeConfiguration>> {
    load(&loader(root)?)
}
