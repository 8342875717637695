//! Builds real configuration libraries with cargo and loads them.
//!
//! These need a Rust toolchain and the registry crates sprout-sdk depends
//! on, so they only run on request:
//! `cargo test -p sprout-core --test dylib -- --ignored`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sprout_core::{
    CompilerSettings, ConfigError, ConfigHolder, ConfigLoader, ConfigModule, DylibLoader,
    LoadState, ModuleLoader, Profile, Settings, Workspace,
};
use sprout_sdk::{ABI_VERSION, RUSTC_FINGERPRINT};
use tempfile::TempDir;

const EXPORTED: &str = r#"
use sprout_sdk::{export_config, GenericTaskRenderer, GitCli, GitOptions, PartialConfig};

fn config() -> PartialConfig {
    PartialConfig::new()
        .with_version_control(GitCli::new(GitOptions {
            main_branch: "trunk".into(),
            ..Default::default()
        }))
        .with_renderer(GenericTaskRenderer)
}

export_config!(config);
"#;

const BARE: &str = r#"
pub fn config() -> sprout_sdk::PartialConfig {
    sprout_sdk::PartialConfig::new()
}
"#;

fn cargo_available() -> bool {
    match which::which("cargo") {
        Ok(_) => true,
        Err(e) => {
            eprintln!("skipping: cargo not found ({e})");
            false
        }
    }
}

fn sdk_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../sprout-sdk")
        .canonicalize()
        .unwrap()
}

struct Project {
    root: TempDir,
    home: TempDir,
}

impl Project {
    /// A project whose workspace builds sprout-sdk from this checkout
    /// instead of a vendored copy.
    fn new(script: &str) -> Self {
        let p = Self {
            root: TempDir::new().unwrap(),
            home: TempDir::new().unwrap(),
        };
        std::fs::write(p.root.path().join("sprout.config.rs"), script).unwrap();
        std::fs::create_dir_all(p.root.path().join("vendor")).unwrap();

        // Descriptors are never overwritten, so these survive every load.
        let ws = Workspace::ensure(p.root.path(), &p.settings()).unwrap();
        let sdk = sdk_dir().display().to_string().replace('\\', "/");
        let manifest = format!(
            r#"[package]
name = "sprout-config"
version = "0.0.0"
edition = "2021"
publish = false

[lib]
name = "sprout_config"
path = "sprout.config.rs"
crate-type = ["cdylib"]

[dependencies]
sprout-sdk = {{ path = "{sdk}" }}

[workspace]
"#
        );
        std::fs::write(ws.manifest_path(), manifest).unwrap();
        std::fs::create_dir_all(ws.dir().join(".cargo")).unwrap();
        std::fs::write(ws.dir().join(".cargo/config.toml"), "").unwrap();
        p
    }

    fn settings(&self) -> Settings {
        Settings {
            workspace_root: Some(self.home.path().to_path_buf()),
            compiler: CompilerSettings {
                profile: Profile::Debug,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn loader(&self) -> ConfigLoader {
        ConfigLoader::from_settings(
            self.root.path(),
            self.settings(),
            Arc::new(ConfigHolder::new()),
        )
    }
}

#[tokio::test]
#[ignore = "compiles a cdylib with cargo"]
async fn exported_config_builds_and_loads() {
    if !cargo_available() {
        return;
    }
    let p = Project::new(EXPORTED);
    let loader = p.loader();
    let config = loader.load().await.unwrap();
    assert_eq!(loader.state(), LoadState::Ready);
    assert!(config.origin().recompiled);

    let summary = config.summary();
    assert_eq!(summary.version_control, "git");
    assert_eq!(summary.renderer, "generic");
    assert!(summary.defaulted.is_empty(), "{:?}", summary.defaulted);

    let module = DylibLoader.load(&config.origin().artifact).unwrap();
    assert_eq!(module.abi_version(), Some(ABI_VERSION));
    assert_eq!(module.rustc_fingerprint(), Some(RUSTC_FINGERPRINT));
    let factory = module.factory().expect("factory exported");
    assert!(factory().version_control.is_some());

    // A second process reuses the build.
    let again = p.loader().load().await.unwrap();
    assert!(!again.origin().recompiled);
}

#[tokio::test]
#[ignore = "compiles a cdylib with cargo"]
async fn library_without_export_macro_is_shape_error() {
    if !cargo_available() {
        return;
    }
    let p = Project::new(BARE);
    let loader = p.loader();
    let err = loader.load().await.unwrap_err();
    assert!(matches!(err, ConfigError::Shape { .. }), "{err}");
    assert!(err.to_string().contains("export_config!"), "{err}");
    assert_eq!(loader.state(), LoadState::Failed { step: "validating" });
}
