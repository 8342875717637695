//! Compile, cache and load a project's `sprout.config.rs`.
//!
//! The script is built into a dynamic library inside a per-project
//! [`Workspace`], and the build is reused until the script's
//! [`Fingerprint`] changes. [`ConfigLoader`] drives the whole cycle and
//! leaves the merged [`RuntimeConfiguration`] in a [`ConfigHolder`].

pub mod compiler;
pub mod dotenv;
pub mod error;
pub mod fingerprint;
pub mod fingerprint_store;
pub mod io;
pub mod loader;
pub mod module;
pub mod paths;
pub mod runtime;
pub mod settings;
pub mod workspace;

pub use compiler::{CargoCompiler, Compiler};
pub use dotenv::load_env_files;
pub use error::{ConfigError, Result};
pub use fingerprint::{ConfigurationSource, Fingerprint};
pub use fingerprint_store::FingerprintStore;
pub use loader::{CacheStatus, ConfigLoader, LoadState};
pub use module::{ConfigModule, DylibLoader, ModuleLoader, StaticModule};
pub use runtime::{ConfigHolder, ConfigSummary, LoadOrigin, RuntimeConfiguration};
pub use settings::{CompilerSettings, Profile, Settings};
pub use workspace::Workspace;
