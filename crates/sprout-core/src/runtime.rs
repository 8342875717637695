//! The merged configuration every command works against.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use sprout_sdk::{
    GenericTaskRenderer, GitCli, LanguageModel, PartialConfig, Prompt, PromptPurpose,
    TaskRenderer, TicketSource, VersionControl,
};
use tokio::sync::OnceCell;

use crate::error::{ConfigError, Result};
use crate::fingerprint::Fingerprint;
use crate::module::ConfigModule;

/// Where a [`RuntimeConfiguration`] came from.
#[derive(Debug, Clone, Serialize)]
pub struct LoadOrigin {
    pub source: PathBuf,
    pub artifact: PathBuf,
    pub fingerprint: Fingerprint,
    /// False when the cached build was reused.
    pub recompiled: bool,
}

/// Collaborators from the configuration script with host defaults filled in.
///
/// The loaded module is declared last so it is dropped after every
/// collaborator it created.
pub struct RuntimeConfiguration {
    ticket_source: Option<Box<dyn TicketSource>>,
    language_models: BTreeMap<PromptPurpose, Box<dyn LanguageModel>>,
    version_control: Box<dyn VersionControl>,
    renderer: Box<dyn TaskRenderer>,
    defaulted: Vec<&'static str>,
    origin: LoadOrigin,
    _module: Box<dyn ConfigModule>,
}

impl RuntimeConfiguration {
    pub fn from_partial(
        partial: PartialConfig,
        module: Box<dyn ConfigModule>,
        origin: LoadOrigin,
    ) -> Self {
        let PartialConfig {
            ticket_source,
            language_models,
            version_control,
            renderer,
        } = partial;

        let mut defaulted = Vec::new();
        let version_control = version_control.unwrap_or_else(|| {
            defaulted.push("version_control");
            Box::new(GitCli::default())
        });
        let renderer = renderer.unwrap_or_else(|| {
            defaulted.push("renderer");
            Box::new(GenericTaskRenderer)
        });
        if !defaulted.is_empty() {
            tracing::debug!(slots = ?defaulted, "using built-in defaults");
        }

        Self {
            ticket_source,
            language_models,
            version_control,
            renderer,
            defaulted,
            origin,
            _module: module,
        }
    }

    pub fn ticket_source(&self) -> Result<&dyn TicketSource> {
        self.ticket_source
            .as_deref()
            .ok_or_else(|| ConfigError::MissingCollaborator("ticket source".into()))
    }

    pub fn language_model(&self, purpose: PromptPurpose) -> Result<&dyn LanguageModel> {
        self.language_models
            .get(&purpose)
            .map(|m| m.as_ref())
            .ok_or_else(|| ConfigError::MissingCollaborator(format!("{purpose} language model")))
    }

    /// Send `prompt` to the model configured for its purpose.
    pub fn run_prompt(&self, prompt: &Prompt) -> Result<String> {
        let model = self.language_model(prompt.purpose)?;
        tracing::debug!(model = model.name(), purpose = %prompt.purpose, "sending prompt");
        Ok(model.send_prompt(prompt)?)
    }

    pub fn version_control(&self) -> &dyn VersionControl {
        self.version_control.as_ref()
    }

    pub fn renderer(&self) -> &dyn TaskRenderer {
        self.renderer.as_ref()
    }

    pub fn origin(&self) -> &LoadOrigin {
        &self.origin
    }

    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            origin: self.origin.clone(),
            ticket_source: self.ticket_source.as_ref().map(|t| t.name().to_string()),
            language_models: self
                .language_models
                .iter()
                .map(|(purpose, model)| (purpose.as_str().to_string(), model.name().to_string()))
                .collect(),
            version_control: self.version_control.name().to_string(),
            renderer: self.renderer.name().to_string(),
            defaulted: self.defaulted.clone(),
        }
    }
}

impl fmt::Debug for RuntimeConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfiguration")
            .field("summary", &self.summary())
            .finish_non_exhaustive()
    }
}

/// Which collaborator fills each slot.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    #[serde(flatten)]
    pub origin: LoadOrigin,
    pub ticket_source: Option<String>,
    pub language_models: BTreeMap<String, String>,
    pub version_control: String,
    pub renderer: String,
    /// Slots filled by host defaults rather than the script.
    pub defaulted: Vec<&'static str>,
}

/// Process-wide home of the loaded configuration. Filled at most once.
#[derive(Default)]
pub struct ConfigHolder {
    cell: OnceCell<Arc<RuntimeConfiguration>>,
}

impl ConfigHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<RuntimeConfiguration>> {
        self.cell.get().cloned()
    }

    /// Run `init` unless a configuration is already held. A failed `init`
    /// leaves the holder empty.
    pub(crate) async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<RuntimeConfiguration>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<RuntimeConfiguration>>>,
    {
        self.cell.get_or_try_init(init).await.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::StaticModule;
    use sprout_sdk::Task;

    struct Upper;

    impl LanguageModel for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn send_prompt(&self, prompt: &Prompt) -> sprout_sdk::Result<String> {
            Ok(prompt.text.to_uppercase())
        }
    }

    struct Fixed;

    impl TicketSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch_tasks(&self, _query: &str) -> sprout_sdk::Result<Vec<Task>> {
            Ok(vec![Task::new("SPR-1", "one")])
        }

        fn fetch_task(&self, id: &str) -> sprout_sdk::Result<Option<Task>> {
            Ok((id == "SPR-1").then(|| Task::new("SPR-1", "one")))
        }
    }

    struct Plain;

    impl TaskRenderer for Plain {
        fn render_label(&self, task: &Task, _idx: usize) -> String {
            task.title.clone()
        }
    }

    fn origin() -> LoadOrigin {
        LoadOrigin {
            source: PathBuf::from("sprout.config.rs"),
            artifact: PathBuf::from("libsprout_config.so"),
            fingerprint: Fingerprint::of(b"src"),
            recompiled: true,
        }
    }

    fn build(partial: PartialConfig) -> RuntimeConfiguration {
        RuntimeConfiguration::from_partial(partial, Box::new(StaticModule::empty()), origin())
    }

    #[test]
    fn empty_partial_gets_defaults() {
        let config = build(PartialConfig::new());
        assert_eq!(config.version_control().name(), "git");
        assert_eq!(config.renderer().name(), "generic");
        assert_eq!(config.summary().defaulted, vec!["version_control", "renderer"]);
    }

    #[test]
    fn absent_slots_stay_absent() {
        let config = build(PartialConfig::new());
        let err = config.ticket_source().err().unwrap();
        assert_eq!(err.kind(), "collaborator");
        assert!(err.to_string().contains("ticket source"));
        assert!(config.language_model(PromptPurpose::Code).is_err());
    }

    #[test]
    fn supplied_slots_win_over_defaults() {
        let config = build(
            PartialConfig::new()
                .with_ticket_source(Fixed)
                .with_renderer(Plain),
        );
        assert_eq!(config.renderer().name(), "custom");
        assert_eq!(config.ticket_source().unwrap().name(), "fixed");
        let tasks = config.ticket_source().unwrap().fetch_tasks("any").unwrap();
        assert_eq!(config.renderer().render_label(&tasks[0], 0), "one");
        assert_eq!(config.summary().defaulted, vec!["version_control"]);
    }

    #[test]
    fn run_prompt_dispatches_by_purpose() {
        let config = build(PartialConfig::new().with_language_model(PromptPurpose::Code, Upper));
        assert_eq!(config.run_prompt(&Prompt::code("fn main")).unwrap(), "FN MAIN");

        let err = config.run_prompt(&Prompt::text("hello")).unwrap_err();
        assert!(err.to_string().contains("text language model"));
    }

    #[test]
    fn summary_serializes_slot_names() {
        let config = build(PartialConfig::new().with_language_model(PromptPurpose::Text, Upper));
        let json = serde_json::to_value(config.summary()).unwrap();
        assert_eq!(json["language_models"]["text"], "upper");
        assert_eq!(json["version_control"], "git");
        assert!(json["ticket_source"].is_null());
        assert_eq!(json["recompiled"], true);
        assert!(json["fingerprint"].as_str().unwrap().starts_with("xxh3:"));
    }

    #[tokio::test]
    async fn holder_initializes_once() {
        let holder = ConfigHolder::new();
        assert!(holder.get().is_none());

        let failed = holder
            .get_or_try_init(|| async { Err(ConfigError::HomeNotFound) })
            .await;
        assert!(failed.is_err());
        assert!(holder.get().is_none());

        let first = holder
            .get_or_try_init(|| async { Ok(Arc::new(build(PartialConfig::new()))) })
            .await
            .unwrap();
        let second = holder
            .get_or_try_init(|| async { Err(ConfigError::HomeNotFound) })
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
