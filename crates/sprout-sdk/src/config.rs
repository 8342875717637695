//! What a configuration script hands back to the host.

use std::collections::BTreeMap;
use std::fmt;

use crate::llm::{LanguageModel, PromptPurpose};
use crate::render::TaskRenderer;
use crate::ticket::TicketSource;
use crate::vcs::VersionControl;

/// Bumped whenever `PartialConfig` or a collaborator trait changes layout.
/// A compiled config exporting a different value is refused by the host.
pub const ABI_VERSION: u32 = 1;

/// Name of the exported factory function.
pub const FACTORY_SYMBOL: &str = "sprout_config";

/// Name of the exported `u32` static holding the module's [`ABI_VERSION`].
pub const ABI_SYMBOL: &str = "SPROUT_CONFIG_ABI";

/// Name of the exported `u64` static holding the module's [`RUSTC_FINGERPRINT`].
pub const RUSTC_SYMBOL: &str = "SPROUT_CONFIG_RUSTC";

/// Version of this crate. A configuration script must be built against the
/// exact same release as the host.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `rustc --version` of the compiler that built this crate.
pub const RUSTC_VERSION: &str = env!("SPROUT_RUSTC_VERSION");

/// Hash of [`RUSTC_VERSION`]. Rust-ABI values only cross the library
/// boundary safely when both sides were built by the same compiler.
pub const RUSTC_FINGERPRINT: u64 = fnv1a(RUSTC_VERSION.as_bytes());

const fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
        i += 1;
    }
    hash
}

/// Signature of the exported factory.
pub type ConfigFactory = fn() -> Box<PartialConfig>;

/// Collaborators supplied by a configuration script. Every slot is optional;
/// the host fills the ones it has defaults for.
#[derive(Default)]
pub struct PartialConfig {
    pub ticket_source: Option<Box<dyn TicketSource>>,
    pub language_models: BTreeMap<PromptPurpose, Box<dyn LanguageModel>>,
    pub version_control: Option<Box<dyn VersionControl>>,
    pub renderer: Option<Box<dyn TaskRenderer>>,
}

impl PartialConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket_source(mut self, source: impl TicketSource + 'static) -> Self {
        self.ticket_source = Some(Box::new(source));
        self
    }

    pub fn with_language_model(
        mut self,
        purpose: PromptPurpose,
        model: impl LanguageModel + 'static,
    ) -> Self {
        self.language_models.insert(purpose, Box::new(model));
        self
    }

    pub fn with_version_control(mut self, vcs: impl VersionControl + 'static) -> Self {
        self.version_control = Some(Box::new(vcs));
        self
    }

    pub fn with_renderer(mut self, renderer: impl TaskRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }
}

impl fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let models: Vec<(PromptPurpose, &str)> = self
            .language_models
            .iter()
            .map(|(p, m)| (*p, m.name()))
            .collect();
        f.debug_struct("PartialConfig")
            .field("ticket_source", &self.ticket_source.as_ref().map(|t| t.name()))
            .field("language_models", &models)
            .field(
                "version_control",
                &self.version_control.as_ref().map(|v| v.name()),
            )
            .field("renderer", &self.renderer.as_ref().map(|r| r.name()))
            .finish()
    }
}

/// Export a factory function as this crate's sprout configuration.
///
/// ```rust,ignore
/// use sprout_sdk::{export_config, GitCli, PartialConfig};
///
/// fn config() -> PartialConfig {
///     PartialConfig::new().with_version_control(GitCli::default())
/// }
///
/// export_config!(config);
/// ```
#[macro_export]
macro_rules! export_config {
    ($factory:path) => {
        #[no_mangle]
        pub static SPROUT_CONFIG_ABI: u32 = $crate::ABI_VERSION;

        #[no_mangle]
        pub static SPROUT_CONFIG_RUSTC: u64 = $crate::RUSTC_FINGERPRINT;

        #[no_mangle]
        pub fn sprout_config() -> ::std::boxed::Box<$crate::PartialConfig> {
            let factory: fn() -> $crate::PartialConfig = $factory;
            ::std::boxed::Box::new(factory())
        }
    };
}
