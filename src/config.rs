//! Workspace configuration.
//!
//! Loaded from `.taskdown/config.json`. Every field defaults, so configs
//! written by older versions keep working when new fields appear.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Ordered set of allowed status values.
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,

    /// Ordered set of allowed priority values.
    #[serde(default = "default_priorities")]
    pub priorities: Vec<String>,

    /// Status that marks a task finished.
    #[serde(default = "default_terminal_status")]
    pub terminal_status: String,

    /// Status that marks a task abandoned; also counts as finished.
    #[serde(default = "default_cancelled_status")]
    pub cancelled_status: String,

    #[serde(default = "default_status")]
    pub default_status: String,

    #[serde(default = "default_priority")]
    pub default_priority: String,

    #[serde(default)]
    pub performance: PerformanceConfig,

    #[serde(default)]
    pub close_checks: CloseChecksConfig,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            statuses: default_statuses(),
            priorities: default_priorities(),
            terminal_status: default_terminal_status(),
            cancelled_status: default_cancelled_status(),
            default_status: default_status(),
            default_priority: default_priority(),
            performance: PerformanceConfig::default(),
            close_checks: CloseChecksConfig::default(),
        }
    }
}

fn default_statuses() -> Vec<String> {
    vec!["To Do".into(), "In Progress".into(), "Done".into()]
}

fn default_priorities() -> Vec<String> {
    vec!["low".into(), "medium".into(), "high".into()]
}

fn default_terminal_status() -> String {
    "Done".to_string()
}

fn default_cancelled_status() -> String {
    "Cancelled".to_string()
}

fn default_status() -> String {
    "To Do".to_string()
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Select the index-backed repository instead of the full-scan one.
    #[serde(default = "default_true")]
    pub use_index: bool,

    /// Rebuild the index from scratch when the workspace opens.
    #[serde(default)]
    pub rebuild_index_on_start: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            use_index: true,
            rebuild_index_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseChecksConfig {
    #[serde(default = "default_true")]
    pub subtasks: bool,

    #[serde(default = "default_true")]
    pub dependencies: bool,

    #[serde(default = "default_true")]
    pub blocked_by: bool,

    #[serde(default = "default_true")]
    pub acceptance_criteria: bool,

    /// Permit `force` to bypass every blocking check.
    #[serde(default = "default_true")]
    pub allow_force: bool,

    #[serde(default = "default_true")]
    pub warn_missing_review: bool,

    #[serde(default = "default_true")]
    pub warn_early_close: bool,

    #[serde(default = "default_true")]
    pub warn_late_close: bool,

    /// Warn when a task closes within this many minutes of creation.
    /// Zero disables the check.
    #[serde(default)]
    pub quick_close_minutes: u64,

    /// Assignee names treated as automated agents for the review warning.
    #[serde(default = "default_agent_assignees")]
    pub agent_assignees: Vec<String>,
}

impl Default for CloseChecksConfig {
    fn default() -> Self {
        Self {
            subtasks: true,
            dependencies: true,
            blocked_by: true,
            acceptance_criteria: true,
            allow_force: true,
            warn_missing_review: true,
            warn_early_close: true,
            warn_late_close: true,
            quick_close_minutes: 0,
            agent_assignees: default_agent_assignees(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_agent_assignees() -> Vec<String> {
    vec!["ai-agent".into()]
}

impl WorkspaceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Treats both the terminal and the cancelled status as finished.
    pub fn is_finished(&self, status: &str) -> bool {
        status == self.terminal_status || status == self.cancelled_status
    }
}
