//! Workspace façade.
//!
//! Owns the configuration and exactly one repository, and is the only place
//! relationship propagation happens: creating or re-pointing dependencies
//! and parents updates every affected peer, primary write first, peers in
//! discovery order, first error aborts with no rollback.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::close::{self, CloseSuggestions, CloseValidation};
use crate::config::WorkspaceConfig;
use crate::error::{Result, TaskdownError};
use crate::model::{Task, TaskDraft, TaskPatch};
use crate::store::indexed::IndexedRepository;
use crate::store::paths;
use crate::store::plain::PlainRepository;
use crate::store::{Repository, SyncStats, TaskFilter};

pub struct Workspace {
    root: PathBuf,
    config: WorkspaceConfig,
    repo: Box<dyn Repository>,
    actor: String,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Create the workspace skeleton and a default config, then open it.
    pub fn init(root: &Path) -> Result<Self> {
        Self::init_with(root, WorkspaceConfig::default())
    }

    pub fn init_with(root: &Path, config: WorkspaceConfig) -> Result<Self> {
        if paths::config_path(root).exists() {
            return Err(TaskdownError::AlreadyInitialized);
        }
        fs::create_dir_all(paths::tasks_dir(root))?;
        fs::create_dir_all(paths::cache_dir(root))?;
        config.save(&paths::config_path(root))?;
        Self::open(root)
    }

    pub fn open(root: &Path) -> Result<Self> {
        let config_path = paths::config_path(root);
        if !config_path.exists() {
            return Err(TaskdownError::NotInitialized);
        }
        let config = WorkspaceConfig::load(&config_path)?;

        let repo: Box<dyn Repository> = if config.performance.use_index {
            Box::new(IndexedRepository::open(root)?)
        } else {
            Box::new(PlainRepository::new(root))
        };
        if config.performance.rebuild_index_on_start {
            debug!("rebuilding index on workspace open");
            repo.rebuild()?;
        }

        Ok(Self {
            root: root.to_path_buf(),
            config,
            repo,
            actor: "system".to_string(),
        })
    }

    /// Walk up from `start` to the enclosing workspace root.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        paths::find_root(start)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn set_actor(&mut self, actor: impl Into<String>) {
        self.actor = actor.into();
    }

    pub fn statuses(&self) -> &[String] {
        &self.config.statuses
    }

    pub fn priorities(&self) -> &[String] {
        &self.config.priorities
    }

    fn allowed_statuses(&self) -> Vec<String> {
        let mut out = self.config.statuses.clone();
        for extra in [&self.config.terminal_status, &self.config.cancelled_status] {
            if !out.iter().any(|s| s == extra) {
                out.push(extra.clone());
            }
        }
        out
    }

    pub fn validate_status(&self, status: &str) -> Result<()> {
        let allowed = self.allowed_statuses();
        if allowed.iter().any(|s| s == status) {
            return Ok(());
        }
        Err(TaskdownError::Validation(format!(
            "unknown status '{status}'; allowed values: {}",
            allowed.join(", ")
        )))
    }

    pub fn validate_priority(&self, priority: &str) -> Result<()> {
        if self.config.priorities.iter().any(|p| p == priority) {
            return Ok(());
        }
        Err(TaskdownError::Validation(format!(
            "unknown priority '{priority}'; allowed values: {}",
            self.config.priorities.join(", ")
        )))
    }

    fn ensure_exists(&self, id: u64) -> Result<()> {
        match self.repo.fetch(id)? {
            Some(_) => Ok(()),
            None => Err(TaskdownError::TaskNotFound(id)),
        }
    }

    pub fn get_task(&self, id: u64) -> Result<Task> {
        self.repo
            .fetch(id)?
            .ok_or(TaskdownError::TaskNotFound(id))
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.repo.query(filter)
    }

    pub fn subtasks_of(&self, parent_id: u64) -> Result<Vec<Task>> {
        self.repo.query(&TaskFilter {
            parent: Some(parent_id),
            ..Default::default()
        })
    }

    /// Unfinished tasks with at least one unfinished dependency.
    pub fn blocked_tasks(&self) -> Result<Vec<Task>> {
        let all = self.repo.query(&TaskFilter::default())?;
        let finished: HashMap<u64, bool> = all
            .iter()
            .map(|t| (t.id, self.config.is_finished(&t.status)))
            .collect();
        Ok(all
            .into_iter()
            .filter(|t| {
                !self.config.is_finished(&t.status)
                    && t.dependencies
                        .iter()
                        .any(|d| matches!(finished.get(d), Some(false)))
            })
            .collect())
    }

    pub fn create_task(&self, draft: TaskDraft) -> Result<Task> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskdownError::Validation(
                "task title must not be empty".into(),
            ));
        }
        let status = draft
            .status
            .unwrap_or_else(|| self.config.default_status.clone());
        let priority = draft
            .priority
            .unwrap_or_else(|| self.config.default_priority.clone());
        self.validate_status(&status)?;
        self.validate_priority(&priority)?;

        // Every referenced task must exist before anything is written.
        if let Some(pid) = draft.parent_task {
            self.ensure_exists(pid)?;
        }
        for &dep in &draft.dependencies {
            self.ensure_exists(dep)?;
        }

        let id = self.repo.next_id()?;
        let mut task = Task::new(id, title.clone(), status);
        task.priority = priority;
        task.description = draft.description;
        task.milestone = draft.milestone;
        task.assignees = draft.assignees;
        task.labels = draft.labels;
        task.parent_task = draft.parent_task;
        task.dependencies = draft.dependencies;
        task.acceptance_criteria = draft.acceptance_criteria;
        task.start_date = draft.start_date;
        task.end_date = draft.end_date;
        task.release_date = draft.release_date;
        task.path = Some(paths::task_path(&self.root, id, &title));
        task.normalize();
        task.log_change("created", "", &self.actor);

        self.repo.create(&task)?;

        if let Some(pid) = task.parent_task {
            self.attach_subtask(pid, id)?;
        }
        let deps = task.dependencies.clone();
        self.propagate_dependency_diff(id, &deps, &[])?;

        Ok(task)
    }

    pub fn update_task(&self, id: u64, patch: TaskPatch) -> Result<Task> {
        let mut task = self.get_task(id)?;
        let old_status = task.status.clone();
        let old_priority = task.priority.clone();
        let old_milestone = task.milestone.clone();
        let old_deps = task.dependencies.clone();

        if let Some(ref s) = patch.status {
            self.validate_status(s)?;
        }
        if let Some(ref p) = patch.priority {
            self.validate_priority(p)?;
        }
        if let Some(ref deps) = patch.dependencies {
            if deps.contains(&id) {
                return Err(TaskdownError::Validation(
                    "task cannot depend on itself".into(),
                ));
            }
            for &dep in deps {
                self.ensure_exists(dep)?;
            }
        }

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(TaskdownError::Validation(
                    "task title must not be empty".into(),
                ));
            }
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(milestone) = patch.milestone {
            task.milestone = milestone;
        }
        if let Some(assignees) = patch.assignees {
            task.assignees = assignees;
        }
        if let Some(labels) = patch.labels {
            task.labels = labels;
        }
        if let Some(dependencies) = patch.dependencies {
            task.dependencies = dependencies;
        }
        if let Some(criteria) = patch.acceptance_criteria {
            task.acceptance_criteria = criteria;
        }
        if let Some(start) = patch.start_date {
            task.start_date = start;
        }
        if let Some(end) = patch.end_date {
            task.end_date = end;
        }
        if let Some(release) = patch.release_date {
            task.release_date = release;
        }

        let mut changes = Vec::new();
        if task.status != old_status {
            changes.push(format!("status: {old_status} -> {}", task.status));
            if task.status == self.config.terminal_status {
                task.closed_date = Some(Utc::now());
            }
        }
        if task.priority != old_priority {
            changes.push(format!("priority: {old_priority} -> {}", task.priority));
        }
        if task.milestone != old_milestone {
            let describe = |m: &Option<String>| m.clone().unwrap_or_else(|| "none".into());
            changes.push(format!(
                "milestone: {} -> {}",
                describe(&old_milestone),
                describe(&task.milestone)
            ));
        }

        task.updated_date = Utc::now();
        if changes.is_empty() {
            task.log_change("modified", "", &self.actor);
        } else {
            task.log_change("updated", changes.join("; "), &self.actor);
        }
        task.normalize();

        self.repo.update(&task)?;

        let added: Vec<u64> = task
            .dependencies
            .iter()
            .copied()
            .filter(|d| !old_deps.contains(d))
            .collect();
        let removed: Vec<u64> = old_deps
            .iter()
            .copied()
            .filter(|d| !task.dependencies.contains(d))
            .collect();
        self.propagate_dependency_diff(id, &added, &removed)?;

        Ok(task)
    }

    fn attach_subtask(&self, parent_id: u64, child_id: u64) -> Result<()> {
        let mut parent = self.get_task(parent_id)?;
        if parent.subtasks.contains(&child_id) {
            return Ok(());
        }
        parent.subtasks.push(child_id);
        parent.subtasks.sort_unstable();
        parent.updated_date = Utc::now();
        parent.log_change("subtask_added", format!("added subtask {child_id}"), &self.actor);
        self.repo.update(&parent)
    }

    /// Mirror a dependency-list change onto the affected peers' blocked-by
    /// lists. Peer writes happen after the primary write, in order; the
    /// first failure aborts the remainder.
    fn propagate_dependency_diff(&self, id: u64, added: &[u64], removed: &[u64]) -> Result<()> {
        for &dep in added {
            let mut peer = self.get_task(dep)?;
            if peer.blocked_by.contains(&id) {
                continue;
            }
            peer.blocked_by.push(id);
            peer.blocked_by.sort_unstable();
            peer.updated_date = Utc::now();
            peer.log_change(
                "blocked_by_added",
                format!("task {id} now depends on this"),
                &self.actor,
            );
            self.repo.update(&peer)?;
        }
        for &dep in removed {
            // A vanished peer has nothing left to unlink.
            let Some(mut peer) = self.repo.fetch(dep)? else {
                continue;
            };
            if !peer.blocked_by.contains(&id) {
                continue;
            }
            peer.blocked_by.retain(|&b| b != id);
            peer.updated_date = Utc::now();
            peer.log_change(
                "blocked_by_removed",
                format!("task {id} no longer depends on this"),
                &self.actor,
            );
            self.repo.update(&peer)?;
        }
        Ok(())
    }

    fn set_text_field(
        &self,
        id: u64,
        action: &'static str,
        text: String,
        apply: impl FnOnce(&mut Task, String),
    ) -> Result<Task> {
        let mut task = self.get_task(id)?;
        apply(&mut task, text);
        task.updated_date = Utc::now();
        task.log_change(action, "", &self.actor);
        self.repo.update(&task)?;
        Ok(task)
    }

    pub fn set_plan(&self, id: u64, text: impl Into<String>) -> Result<Task> {
        self.set_text_field(id, "plan_updated", text.into(), |t, s| t.ai_plan = s)
    }

    pub fn set_notes(&self, id: u64, text: impl Into<String>) -> Result<Task> {
        self.set_text_field(id, "notes_updated", text.into(), |t, s| t.ai_notes = s)
    }

    pub fn set_documentation(&self, id: u64, text: impl Into<String>) -> Result<Task> {
        self.set_text_field(id, "documentation_updated", text.into(), |t, s| {
            t.ai_documentation = s
        })
    }

    pub fn set_review(&self, id: u64, text: impl Into<String>) -> Result<Task> {
        self.set_text_field(id, "review_updated", text.into(), |t, s| t.ai_review = s)
    }

    /// Remove a task and scrub its id from every peer's relationship lists.
    pub fn delete_task(&self, id: u64) -> Result<()> {
        self.ensure_exists(id)?;

        let peers = self.repo.query(&TaskFilter::default())?;
        for mut peer in peers {
            if peer.id == id {
                continue;
            }
            let before = (
                peer.parent_task,
                peer.subtasks.len(),
                peer.dependencies.len(),
                peer.blocked_by.len(),
            );
            if peer.parent_task == Some(id) {
                peer.parent_task = None;
            }
            peer.subtasks.retain(|&s| s != id);
            peer.dependencies.retain(|&d| d != id);
            peer.blocked_by.retain(|&b| b != id);
            let after = (
                peer.parent_task,
                peer.subtasks.len(),
                peer.dependencies.len(),
                peer.blocked_by.len(),
            );
            if before == after {
                continue;
            }
            peer.updated_date = Utc::now();
            peer.log_change(
                "link_removed",
                format!("removed links to deleted task {id}"),
                &self.actor,
            );
            self.repo.update(&peer)?;
        }

        self.repo.delete(id)
    }

    pub fn validate_close(&self, id: u64, force: bool) -> Result<CloseValidation> {
        let task = self.get_task(id)?;
        let all = self.repo.query(&TaskFilter::default())?;
        Ok(close::validate_close(
            &task,
            &all,
            force,
            &self.config,
            Utc::now(),
        ))
    }

    /// Gate, then transition to the terminal status and report follow-ups.
    pub fn close_task(&self, id: u64, force: bool) -> Result<(Task, CloseSuggestions)> {
        let task = self.get_task(id)?;
        let all = self.repo.query(&TaskFilter::default())?;
        let validation = close::validate_close(&task, &all, force, &self.config, Utc::now());
        if !validation.valid {
            let reasons = validation
                .blocking
                .iter()
                .map(|b| b.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TaskdownError::CloseBlocked(id, reasons));
        }

        let updated = self.update_task(
            id,
            TaskPatch {
                status: Some(self.config.terminal_status.clone()),
                ..Default::default()
            },
        )?;
        let suggestions = close::post_close_suggestions(&updated, &all, &self.config);
        Ok((updated, suggestions))
    }

    pub fn refresh_index(&self) -> Result<SyncStats> {
        self.repo.sync()
    }

    pub fn rebuild_index(&self) -> Result<SyncStats> {
        self.repo.rebuild()
    }

    /// Release the repository's resources. Idempotent; also runs on drop.
    pub fn close(&self) -> Result<()> {
        self.repo.close()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = self.repo.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_config() -> WorkspaceConfig {
        let mut config = WorkspaceConfig::default();
        config.performance.use_index = false;
        config
    }

    fn arena() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::init_with(dir.path(), plain_config()).unwrap();
        (dir, ws)
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn init_twice_fails() {
        let (dir, _ws) = arena();
        let err = Workspace::init(dir.path()).unwrap_err();
        assert_eq!(err.code(), "already_initialized");
    }

    #[test]
    fn open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = Workspace::open(dir.path()).unwrap_err();
        assert_eq!(err.code(), "not_initialized");
    }

    #[test]
    fn ids_are_sequential() {
        let (_dir, ws) = arena();
        assert_eq!(ws.create_task(draft("A")).unwrap().id, 1);
        assert_eq!(ws.create_task(draft("B")).unwrap().id, 2);
        assert_eq!(ws.create_task(draft("C")).unwrap().id, 3);
    }

    #[test]
    fn create_applies_configured_defaults() {
        let (_dir, ws) = arena();
        let task = ws.create_task(draft("A")).unwrap();
        assert_eq!(task.status, "To Do");
        assert_eq!(task.priority, "medium");
        assert_eq!(task.changelog.len(), 1);
        assert_eq!(task.changelog[0].action, "created");
    }

    #[test]
    fn invalid_status_aborts_before_any_write() {
        let (_dir, ws) = arena();
        let mut d = draft("A");
        d.status = Some("Bogus".into());
        let err = ws.create_task(d).unwrap_err();
        assert_eq!(err.code(), "validation");
        assert!(err.to_string().contains("To Do"));
        assert!(ws.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn missing_parent_aborts_before_any_write() {
        let (_dir, ws) = arena();
        let mut d = draft("A");
        d.parent_task = Some(99);
        let err = ws.create_task(d).unwrap_err();
        assert_eq!(err.code(), "task_not_found");
        assert!(ws.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn parent_gains_each_child_exactly_once() {
        let (_dir, ws) = arena();
        let parent = ws.create_task(draft("Parent")).unwrap();
        let mut d = draft("Child");
        d.parent_task = Some(parent.id);
        let child = ws.create_task(d).unwrap();

        let parent = ws.get_task(parent.id).unwrap();
        assert_eq!(parent.subtasks, vec![child.id]);
        assert_eq!(ws.subtasks_of(parent.id).unwrap().len(), 1);
    }

    #[test]
    fn dependency_creates_symmetric_link() {
        let (_dir, ws) = arena();
        let base = ws.create_task(draft("Base")).unwrap();
        let mut d = draft("Dependent");
        d.dependencies = vec![base.id];
        let dependent = ws.create_task(d).unwrap();

        let base = ws.get_task(base.id).unwrap();
        assert_eq!(base.blocked_by, vec![dependent.id]);
    }

    #[test]
    fn dependency_diff_updates_both_sides() {
        let (_dir, ws) = arena();
        let a = ws.create_task(draft("A")).unwrap();
        let b = ws.create_task(draft("B")).unwrap();
        let c = ws.create_task(draft("C")).unwrap();

        ws.update_task(
            c.id,
            TaskPatch {
                dependencies: Some(vec![a.id]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(ws.get_task(a.id).unwrap().blocked_by, vec![c.id]);

        ws.update_task(
            c.id,
            TaskPatch {
                dependencies: Some(vec![b.id]),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(ws.get_task(a.id).unwrap().blocked_by.is_empty());
        assert_eq!(ws.get_task(b.id).unwrap().blocked_by, vec![c.id]);

        ws.update_task(
            c.id,
            TaskPatch {
                dependencies: Some(vec![]),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(ws.get_task(b.id).unwrap().blocked_by.is_empty());
    }

    #[test]
    fn self_dependency_is_rejected() {
        let (_dir, ws) = arena();
        let a = ws.create_task(draft("A")).unwrap();
        let err = ws
            .update_task(
                a.id,
                TaskPatch {
                    dependencies: Some(vec![a.id]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn update_appends_exactly_one_changelog_entry() {
        let (_dir, ws) = arena();
        let a = ws.create_task(draft("A")).unwrap();

        let updated = ws
            .update_task(
                a.id,
                TaskPatch {
                    status: Some("In Progress".into()),
                    priority: Some("high".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.changelog.len(), 2);
        let entry = &updated.changelog[1];
        assert_eq!(entry.action, "updated");
        assert!(entry.details.contains("status: To Do -> In Progress"));
        assert!(entry.details.contains("priority: medium -> high"));

        let touched = ws
            .update_task(
                a.id,
                TaskPatch {
                    description: Some("body".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(touched.changelog.len(), 3);
        assert_eq!(touched.changelog[2].action, "modified");
    }

    #[test]
    fn entering_terminal_status_sets_closed_date() {
        let (_dir, ws) = arena();
        let a = ws.create_task(draft("A")).unwrap();
        assert!(a.closed_date.is_none());

        let closed = ws
            .update_task(
                a.id,
                TaskPatch {
                    status: Some("Done".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(closed.closed_date.is_some());
    }

    #[test]
    fn collaboration_setters_record_changes() {
        let (_dir, ws) = arena();
        let a = ws.create_task(draft("A")).unwrap();
        ws.set_plan(a.id, "step one").unwrap();
        ws.set_notes(a.id, "scratch").unwrap();
        ws.set_documentation(a.id, "docs").unwrap();
        let task = ws.set_review(a.id, "ship it").unwrap();

        assert_eq!(task.ai_plan, "step one");
        assert_eq!(task.ai_review, "ship it");
        let actions: Vec<_> = task.changelog.iter().map(|e| e.action.as_str()).collect();
        assert!(actions.contains(&"plan_updated"));
        assert!(actions.contains(&"review_updated"));
    }

    #[test]
    fn delete_scrubs_links_from_peers() {
        let (_dir, ws) = arena();
        let parent = ws.create_task(draft("Parent")).unwrap();
        let mut d = draft("Child");
        d.parent_task = Some(parent.id);
        d.dependencies = vec![parent.id];
        let child = ws.create_task(d).unwrap();

        ws.delete_task(parent.id).unwrap();

        let child = ws.get_task(child.id).unwrap();
        assert_eq!(child.parent_task, None);
        assert!(child.dependencies.is_empty());
        let err = ws.get_task(parent.id).unwrap_err();
        assert_eq!(err.code(), "task_not_found");
    }

    #[test]
    fn blocked_tasks_reports_unfinished_dependencies() {
        let (_dir, ws) = arena();
        let base = ws.create_task(draft("Base")).unwrap();
        let mut d = draft("Waiting");
        d.dependencies = vec![base.id];
        let waiting = ws.create_task(d).unwrap();

        let blocked = ws.blocked_tasks().unwrap();
        assert_eq!(blocked.iter().map(|t| t.id).collect::<Vec<_>>(), vec![waiting.id]);

        ws.update_task(
            base.id,
            TaskPatch {
                status: Some("Done".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(ws.blocked_tasks().unwrap().is_empty());
    }

    #[test]
    fn close_task_gates_on_open_subtasks() {
        let (_dir, ws) = arena();
        let parent = ws.create_task(draft("Parent")).unwrap();
        let mut d = draft("Child");
        d.parent_task = Some(parent.id);
        let child = ws.create_task(d).unwrap();

        let err = ws.close_task(parent.id, false).unwrap_err();
        assert_eq!(err.code(), "close_blocked");

        let v = ws.validate_close(parent.id, false).unwrap();
        assert!(!v.valid);
        assert_eq!(v.blocking[0].task_ids, vec![child.id]);

        ws.update_task(
            child.id,
            TaskPatch {
                status: Some("Done".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let (closed, _suggestions) = ws.close_task(parent.id, false).unwrap();
        assert_eq!(closed.status, "Done");
        assert!(closed.closed_date.is_some());
    }

    #[test]
    fn forced_close_bypasses_gating() {
        let (_dir, ws) = arena();
        let parent = ws.create_task(draft("Parent")).unwrap();
        let mut d = draft("Child");
        d.parent_task = Some(parent.id);
        ws.create_task(d).unwrap();

        let (closed, _suggestions) = ws.close_task(parent.id, true).unwrap();
        assert_eq!(closed.status, "Done");
    }

    #[test]
    fn close_reports_peers_freed_for_close() {
        let (_dir, ws) = arena();
        let base = ws.create_task(draft("Base")).unwrap();
        let mut d = draft("Dependent");
        d.dependencies = vec![base.id];
        let dependent = ws.create_task(d).unwrap();

        // Base cannot close while an open task depends on it.
        let v = ws.validate_close(base.id, false).unwrap();
        assert!(!v.valid);
        assert_eq!(v.blocking[0].task_ids, vec![dependent.id]);

        // Closing the dependent frees base.
        let (_closed, suggestions) = ws.close_task(dependent.id, true).unwrap();
        assert_eq!(suggestions.unblocked, vec![base.id]);
        assert!(ws.validate_close(base.id, false).unwrap().valid);
    }

    #[test]
    fn find_root_locates_the_workspace() {
        let (dir, _ws) = arena();
        let nested = dir.path().join("deep/inside");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(Workspace::find_root(&nested), Some(dir.path().to_path_buf()));
    }
}
