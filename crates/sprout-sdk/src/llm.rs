use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What a prompt is for. Each purpose can be served by a different model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptPurpose {
    /// Natural-language output: summaries, descriptions, queries.
    Text,
    /// Code-oriented output: branch names, commit messages.
    Code,
}

impl PromptPurpose {
    pub fn all() -> &'static [PromptPurpose] {
        &[PromptPurpose::Text, PromptPurpose::Code]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptPurpose::Text => "text",
            PromptPurpose::Code => "code",
        }
    }
}

impl fmt::Display for PromptPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptPurpose {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(PromptPurpose::Text),
            "code" => Ok(PromptPurpose::Code),
            other => Err(format!("unknown prompt purpose '{other}'; valid: text, code")),
        }
    }
}

/// A fully rendered prompt, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub purpose: PromptPurpose,
    pub text: String,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            purpose: PromptPurpose::Text,
            text: text.into(),
        }
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self {
            purpose: PromptPurpose::Code,
            text: text.into(),
        }
    }
}

/// A language-model client: send a prompt, get text back.
pub trait LanguageModel: Send + Sync {
    /// Model or backend identifier, e.g. `"ollama:llama3"`.
    fn name(&self) -> &str;

    fn send_prompt(&self, prompt: &Prompt) -> Result<String>;
}
