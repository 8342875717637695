use crate::ticket::Task;

/// One selectable entry produced from a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChoice {
    pub label: String,
    pub description: Option<String>,
    pub task: Task,
}

/// Turns tasks into user-facing labels for selection menus.
pub trait TaskRenderer: Send + Sync {
    fn name(&self) -> &str {
        "custom"
    }

    /// `idx` is zero-based; renderers usually print it one-based.
    fn render_label(&self, task: &Task, idx: usize) -> String;

    fn render_task(&self, task: &Task, idx: usize) -> TaskChoice {
        TaskChoice {
            label: self.render_label(task, idx),
            description: task.description.clone(),
            task: task.clone(),
        }
    }

    fn render_tasks(&self, tasks: &[Task]) -> Vec<TaskChoice> {
        tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| self.render_task(task, idx))
            .collect()
    }
}

/// `1) SPR-12 [backend, auth] Fix login (Assignee: ana, Priority: High)`
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericTaskRenderer;

impl TaskRenderer for GenericTaskRenderer {
    fn name(&self) -> &str {
        "generic"
    }

    fn render_label(&self, task: &Task, idx: usize) -> String {
        let mut parts = vec![format!("{})", idx + 1), task.id.clone()];
        if !task.labels.is_empty() {
            parts.push(format!("[{}]", task.labels.join(", ")));
        }
        parts.push(task.title.clone());

        let attrs: Vec<String> = [
            ("Assignee", task.assignee.as_deref()),
            ("Priority", task.priority.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| format!("{key}: {v}")))
        .collect();
        if !attrs.is_empty() {
            parts.push(format!("({})", attrs.join(", ")));
        }

        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_task_label() {
        let label = GenericTaskRenderer.render_label(&Task::new("SPR-1", "Fix login"), 0);
        assert_eq!(label, "1) SPR-1 Fix login");
    }

    #[test]
    fn label_includes_tags_and_attributes() {
        let task = Task {
            labels: vec!["backend".into(), "auth".into()],
            assignee: Some("ana".into()),
            priority: Some("High".into()),
            ..Task::new("SPR-12", "Fix login")
        };
        assert_eq!(
            GenericTaskRenderer.render_label(&task, 2),
            "3) SPR-12 [backend, auth] Fix login (Assignee: ana, Priority: High)"
        );
    }

    #[test]
    fn render_tasks_keeps_order_and_descriptions() {
        let tasks = vec![
            Task {
                description: Some("details".into()),
                ..Task::new("A-1", "first")
            },
            Task::new("A-2", "second"),
        ];
        let choices = GenericTaskRenderer.render_tasks(&tasks);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].description.as_deref(), Some("details"));
        assert!(choices[1].label.starts_with("2) A-2"));
        assert_eq!(choices[1].task, tasks[1]);
    }
}
