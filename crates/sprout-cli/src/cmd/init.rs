use anyhow::Context;
use sprout_core::{io, paths, Settings};
use sprout_sdk::SDK_VERSION;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"//! sprout configuration. Rebuilt automatically whenever this file changes.
//!
//! Every slot is optional: version control defaults to `git` with `main` as
//! the main branch, tasks are rendered with the generic renderer.

use sprout_sdk::{export_config, GenericTaskRenderer, GitCli, GitOptions, PartialConfig};

fn config() -> PartialConfig {
    PartialConfig::new()
        .with_version_control(GitCli::new(GitOptions {
            main_branch: "main".into(),
            ..Default::default()
        }))
        .with_renderer(GenericTaskRenderer)
}

export_config!(config);
"#;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing sprout in: {}", root.display());

    let settings_path = paths::settings_path(root);
    let settings_yaml = Settings::default()
        .to_yaml()
        .context("failed to render default settings")?;
    report(
        paths::SETTINGS_FILE,
        io::write_if_missing(&settings_path, settings_yaml.as_bytes())
            .with_context(|| format!("failed to write {}", settings_path.display()))?,
    );

    let config_path = root.join(paths::DEFAULT_CONFIG_FILE);
    report(
        paths::DEFAULT_CONFIG_FILE,
        io::write_if_missing(&config_path, CONFIG_TEMPLATE.as_bytes())
            .with_context(|| format!("failed to write {}", config_path.display()))?,
    );

    let vendor = root.join(paths::DEFAULT_DEPENDENCY_DIR);
    if !vendor.join("sprout-sdk").is_dir() {
        for line in vendor_hint() {
            println!("{line}");
        }
    }
    Ok(())
}

/// Steps to populate the dependency directory the compiled config builds
/// from. The workspace resolves every crate, sprout-sdk included, from it.
fn vendor_hint() -> Vec<String> {
    vec![
        String::new(),
        format!("Next: list sprout-sdk = \"={SDK_VERSION}\" and the crates your config uses"),
        "in a Cargo.toml at the project root, then run:".to_string(),
        format!("  cargo vendor {}", paths::DEFAULT_DEPENDENCY_DIR),
        "  sprout config check".to_string(),
    ]
}

fn report(name: &str, created: bool) {
    if created {
        println!("  created: {name}");
    } else {
        println!("  exists:  {name}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_exports_a_factory() {
        assert!(CONFIG_TEMPLATE.contains("export_config!(config);"));
        assert!(CONFIG_TEMPLATE.contains("fn config() -> PartialConfig"));
    }

    #[test]
    fn vendor_hint_pins_sdk_and_uses_cargo_vendor() {
        let hint = vendor_hint().join("\n");
        assert!(hint.contains(&format!("sprout-sdk = \"={SDK_VERSION}\"")), "{hint}");
        assert!(hint.contains("cargo vendor vendor"), "{hint}");
        assert!(!hint.contains("path ="), "{hint}");
    }
}
