use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A ticket normalized across tracking systems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    /// Issue type as reported by the tracker (story, bug, ...).
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// TicketSource
// ---------------------------------------------------------------------------

/// Where tasks come from: Jira, Linear, a flat file, anything that can answer
/// a free-form query.
pub trait TicketSource: Send + Sync {
    /// Short identifier shown in diagnostics, e.g. `"jira"`.
    fn name(&self) -> &str;

    fn fetch_tasks(&self, query: &str) -> Result<Vec<Task>>;

    /// `Ok(None)` when the tracker has no task with that identifier.
    fn fetch_task(&self, id: &str) -> Result<Option<Task>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_deserializes_with_only_required_fields() {
        let task: Task = serde_json::from_str(r#"{"id":"SPR-1","title":"Fix login"}"#).unwrap();
        assert_eq!(task, Task::new("SPR-1", "Fix login"));
        assert!(task.labels.is_empty());
    }

    #[test]
    fn empty_optionals_are_skipped_when_serializing() {
        let json = serde_json::to_string(&Task::new("SPR-2", "Docs")).unwrap();
        assert!(!json.contains("assignee"));
        assert!(!json.contains("labels"));
    }
}
