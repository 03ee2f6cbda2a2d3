use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// One acceptance criterion line on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

/// Append-only history entry recorded on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    /// Markdown body of the record; carried outside the front matter.
    #[serde(skip)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changelog: Vec<ChangelogEntry>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ai_plan: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ai_notes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ai_documentation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ai_review: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default = "epoch")]
    pub created_date: DateTime<Utc>,
    #[serde(default = "epoch")]
    pub updated_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<DateTime<Utc>>,
    /// Storage location; assigned by the repository, never written to disk.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl Task {
    pub fn new(id: u64, title: impl Into<String>, status: impl Into<String>) -> Self {
        let now = Utc::now();
        Task {
            id,
            title: title.into(),
            description: String::new(),
            status: status.into(),
            priority: String::new(),
            milestone: None,
            assignees: Vec::new(),
            labels: Vec::new(),
            parent_task: None,
            subtasks: Vec::new(),
            dependencies: Vec::new(),
            blocked_by: Vec::new(),
            acceptance_criteria: Vec::new(),
            changelog: Vec::new(),
            ai_plan: String::new(),
            ai_notes: String::new(),
            ai_documentation: String::new(),
            ai_review: String::new(),
            start_date: None,
            end_date: None,
            release_date: None,
            created_date: now,
            updated_date: now,
            closed_date: None,
            path: None,
        }
    }

    /// Trim whitespace, drop empty entries, then deduplicate and sort id
    /// lists for deterministic storage.
    pub fn normalize(&mut self) {
        for list in [&mut self.assignees, &mut self.labels] {
            for item in list.iter_mut() {
                let trimmed = item.trim();
                if trimmed.len() != item.len() {
                    *item = trimmed.to_string();
                }
            }
            list.retain(|s| !s.is_empty());
            list.sort();
            list.dedup();
        }
        for ids in [
            &mut self.subtasks,
            &mut self.dependencies,
            &mut self.blocked_by,
        ] {
            ids.sort_unstable();
            ids.dedup();
        }
        let trimmed = self.description.trim();
        if trimmed.len() != self.description.len() {
            self.description = trimmed.to_string();
        }
    }

    pub fn log_change(&mut self, action: impl Into<String>, details: impl Into<String>, user: &str) {
        self.changelog.push(ChangelogEntry {
            timestamp: Utc::now(),
            action: action.into(),
            details: details.into(),
            user: user.to_string(),
        });
    }
}

/// Partial update: `None` leaves the field unchanged, `Some` replaces it
/// wholesale. Double options clear the underlying value with `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub milestone: Option<Option<String>>,
    pub assignees: Option<Vec<String>>,
    pub labels: Option<Vec<String>>,
    pub dependencies: Option<Vec<u64>>,
    pub acceptance_criteria: Option<Vec<AcceptanceCriterion>>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub release_date: Option<Option<DateTime<Utc>>>,
}

/// Input for task creation; id, path, timestamps and changelog are assigned
/// by the workspace.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub milestone: Option<String>,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub parent_task: Option<u64>,
    pub dependencies: Vec<u64>,
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub release_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_task_omits_optional_fields() {
        let task = Task::new(1, "Minimal", "To Do");
        let yaml = serde_yaml::to_string(&task).unwrap();
        assert!(!yaml.contains("milestone"));
        assert!(!yaml.contains("assignees"));
        assert!(!yaml.contains("parent_task"));
        assert!(!yaml.contains("dependencies"));
        assert!(!yaml.contains("blocked_by"));
        assert!(!yaml.contains("changelog"));
        assert!(!yaml.contains("ai_plan"));
        assert!(!yaml.contains("closed_date"));
    }

    #[test]
    fn absent_keys_decode_to_defaults() {
        let task: Task = serde_yaml::from_str("id: 7\ntitle: Bare\n").unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.status, "");
        assert!(task.subtasks.is_empty());
        assert!(task.closed_date.is_none());
        assert_eq!(task.created_date, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn normalize_sorts_and_dedups_id_lists() {
        let mut task = Task::new(1, "T", "To Do");
        task.dependencies = vec![3, 1, 3, 2];
        task.blocked_by = vec![9, 9];
        task.normalize();
        assert_eq!(task.dependencies, vec![1, 2, 3]);
        assert_eq!(task.blocked_by, vec![9]);
    }

    #[test]
    fn normalize_trims_and_drops_empty_labels() {
        let mut task = Task::new(1, "T", "To Do");
        task.labels = vec![
            "".into(),
            " ".into(),
            "  valid  ".into(),
            "keep".into(),
            "keep".into(),
        ];
        task.normalize();
        assert_eq!(task.labels, vec!["keep", "valid"]);
    }

    #[test]
    fn log_change_appends_in_order() {
        let mut task = Task::new(1, "T", "To Do");
        task.log_change("created", "", "system");
        task.log_change("status_changed", "To Do -> Done", "alice");
        assert_eq!(task.changelog.len(), 2);
        assert_eq!(task.changelog[0].action, "created");
        assert_eq!(task.changelog[1].user, "alice");
    }
}
