//! Close gating.
//!
//! Pure functions over a task, the surrounding task set, and the workspace
//! configuration. The workspace runs these before a terminal status
//! transition; nothing here touches storage.

use chrono::{DateTime, Duration, Utc};

use crate::config::WorkspaceConfig;
use crate::model::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingKind {
    Subtasks,
    Dependencies,
    BlockedBy,
    AcceptanceCriteria,
}

#[derive(Debug, Clone)]
pub struct BlockingIssue {
    pub kind: BlockingKind,
    pub message: String,
    pub task_ids: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    MissingReview,
    EarlyClose,
    LateClose,
    QuickClose,
}

#[derive(Debug, Clone)]
pub struct CloseWarning {
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct CloseValidation {
    pub valid: bool,
    pub blocking: Vec<BlockingIssue>,
    pub warnings: Vec<CloseWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct CloseSuggestions {
    /// Parent whose subtasks would all be finished once this close lands.
    pub close_parent: Option<u64>,
    /// Unfinished tasks this close releases from their last blocker.
    pub unblocked: Vec<u64>,
}

fn find<'a>(all: &'a [Task], id: u64) -> Option<&'a Task> {
    all.iter().find(|t| t.id == id)
}

/// Ids in `ids` whose task exists and is not finished. Dangling ids cannot
/// hold up a close and are ignored.
fn unfinished(ids: &[u64], all: &[Task], config: &WorkspaceConfig) -> Vec<u64> {
    ids.iter()
        .copied()
        .filter(|id| find(all, *id).is_some_and(|t| !config.is_finished(&t.status)))
        .collect()
}

pub fn validate_close(
    task: &Task,
    all: &[Task],
    force: bool,
    config: &WorkspaceConfig,
    now: DateTime<Utc>,
) -> CloseValidation {
    let checks = &config.close_checks;

    if force && checks.allow_force {
        return CloseValidation {
            valid: true,
            blocking: Vec::new(),
            warnings: Vec::new(),
        };
    }

    let mut blocking = Vec::new();

    if checks.subtasks {
        let open = unfinished(&task.subtasks, all, config);
        if !open.is_empty() {
            blocking.push(BlockingIssue {
                kind: BlockingKind::Subtasks,
                message: format!("{} unfinished subtask(s)", open.len()),
                task_ids: open,
            });
        }
    }

    if checks.dependencies {
        let open = unfinished(&task.dependencies, all, config);
        if !open.is_empty() {
            blocking.push(BlockingIssue {
                kind: BlockingKind::Dependencies,
                message: format!("{} unfinished dependenc(ies)", open.len()),
                task_ids: open,
            });
        }
    }

    if checks.blocked_by {
        let open = unfinished(&task.blocked_by, all, config);
        if !open.is_empty() {
            blocking.push(BlockingIssue {
                kind: BlockingKind::BlockedBy,
                message: format!("still blocked by {} task(s)", open.len()),
                task_ids: open,
            });
        }
    }

    if checks.acceptance_criteria && !task.acceptance_criteria.is_empty() {
        let checked = task.acceptance_criteria.iter().filter(|c| c.checked).count();
        let total = task.acceptance_criteria.len();
        if checked < total {
            blocking.push(BlockingIssue {
                kind: BlockingKind::AcceptanceCriteria,
                message: format!("{checked} of {total} acceptance criteria checked"),
                task_ids: Vec::new(),
            });
        }
    }

    let valid = blocking.is_empty();
    let mut warnings = Vec::new();

    if valid && !force {
        if checks.warn_missing_review
            && task.ai_review.is_empty()
            && task
                .assignees
                .iter()
                .any(|a| checks.agent_assignees.contains(a))
        {
            warnings.push(CloseWarning {
                kind: WarningKind::MissingReview,
                message: "assigned to an agent but no review was recorded".into(),
            });
        }

        if let Some(end) = task.end_date {
            if now < end && checks.warn_early_close {
                warnings.push(CloseWarning {
                    kind: WarningKind::EarlyClose,
                    message: format!("closing {} day(s) before the planned end date", (end - now).num_days()),
                });
            } else if now > end && checks.warn_late_close {
                warnings.push(CloseWarning {
                    kind: WarningKind::LateClose,
                    message: format!("closing {} day(s) after the planned end date", (now - end).num_days()),
                });
            }
        }

        if checks.quick_close_minutes > 0
            && now - task.created_date < Duration::minutes(checks.quick_close_minutes as i64)
        {
            warnings.push(CloseWarning {
                kind: WarningKind::QuickClose,
                message: format!(
                    "closed within {} minute(s) of creation",
                    checks.quick_close_minutes
                ),
            });
        }
    }

    CloseValidation {
        valid,
        blocking,
        warnings,
    }
}

/// Follow-up candidates once `task` is finished. `all` may contain the task
/// in its pre-close state; it is treated as finished here.
pub fn post_close_suggestions(
    task: &Task,
    all: &[Task],
    config: &WorkspaceConfig,
) -> CloseSuggestions {
    let close_parent = task.parent_task.and_then(|pid| {
        let parent = find(all, pid)?;
        if config.is_finished(&parent.status) {
            return None;
        }
        all.iter()
            .filter(|t| t.parent_task == Some(pid) && t.id != task.id)
            .all(|t| config.is_finished(&t.status))
            .then_some(pid)
    });

    let mut unblocked: Vec<u64> = all
        .iter()
        .filter(|t| {
            t.id != task.id
                && !config.is_finished(&t.status)
                && t.blocked_by.contains(&task.id)
        })
        .map(|t| t.id)
        .collect();
    unblocked.sort_unstable();

    CloseSuggestions {
        close_parent,
        unblocked,
    }
}
