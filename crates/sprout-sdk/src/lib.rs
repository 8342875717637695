//! `sprout-sdk`: the surface a `sprout.config.rs` script is written against.
//!
//! A configuration script is compiled by `sprout` into a dynamic library and
//! loaded at startup. It picks one implementation per collaborator slot and
//! exports a factory:
//!
//! ```rust,ignore
//! use sprout_sdk::{export_config, GenericTaskRenderer, GitCli, GitOptions, PartialConfig};
//!
//! fn config() -> PartialConfig {
//!     PartialConfig::new()
//!         .with_version_control(GitCli::new(GitOptions {
//!             main_branch: "trunk".into(),
//!             ..Default::default()
//!         }))
//!         .with_renderer(GenericTaskRenderer)
//! }
//!
//! export_config!(config);
//! ```
//!
//! Collaborator traits are synchronous: their code runs inside the loaded
//! module, which links its own copy of every dependency.

pub mod config;
pub mod error;
pub mod llm;
pub mod render;
pub mod ticket;
pub mod vcs;

pub use config::{
    ConfigFactory, PartialConfig, ABI_SYMBOL, ABI_VERSION, FACTORY_SYMBOL, RUSTC_FINGERPRINT,
    RUSTC_SYMBOL, RUSTC_VERSION, SDK_VERSION,
};
pub use error::{CollaboratorError, Result};
pub use llm::{LanguageModel, Prompt, PromptPurpose};
pub use render::{GenericTaskRenderer, TaskChoice, TaskRenderer};
pub use ticket::{Task, TicketSource};
pub use vcs::{ChangeType, GitCli, GitOptions, IssueBranch, VersionControl};
