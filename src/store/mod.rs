pub mod index;
pub mod indexed;
pub mod paths;
pub mod plain;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Task;

/// Conjunctive task filter; `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub label: Option<String>,
    pub milestone: Option<String>,
    pub parent: Option<u64>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(ref s) = self.status
            && task.status != *s
        {
            return false;
        }
        if let Some(ref p) = self.priority
            && task.priority != *p
        {
            return false;
        }
        if let Some(ref a) = self.assignee
            && !task.assignees.iter().any(|x| x == a)
        {
            return false;
        }
        if let Some(ref l) = self.label
            && !task.labels.iter().any(|x| x == l)
        {
            return false;
        }
        if let Some(ref m) = self.milestone
            && task.milestone.as_deref() != Some(m.as_str())
        {
            return false;
        }
        if let Some(p) = self.parent
            && task.parent_task != Some(p)
        {
            return false;
        }
        true
    }
}

/// Counters reported by an index synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Task files seen on disk.
    pub scanned: usize,
    /// Files actually re-decoded (new or changed).
    pub decoded: usize,
    /// Index entries dropped because their file vanished.
    pub removed: usize,
    /// Corrupt files logged and left out of the index.
    pub skipped: usize,
}

/// Storage contract shared by the plain and the indexed repository.
///
/// Task files are the source of truth in both cases; `sync`/`rebuild`/`close`
/// only matter for backends that maintain derived state.
pub trait Repository {
    /// All tasks matching `filter`, ascending by id.
    fn query(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    fn fetch(&self, id: u64) -> Result<Option<Task>>;

    /// Persist a new task; the caller has already assigned id and path.
    /// Errors if the target file exists.
    fn create(&self, task: &Task) -> Result<()>;

    /// Whole-file replace at the task's path.
    fn update(&self, task: &Task) -> Result<()>;

    /// Remove the backing file; succeeds when the task is already gone.
    fn delete(&self, id: u64) -> Result<()>;

    /// Highest existing id plus one, computed from the authoritative set at
    /// call time. Concurrent callers can race to the same id; the workspace
    /// documents single-writer usage.
    fn next_id(&self) -> Result<u64>;

    fn sync(&self) -> Result<SyncStats> {
        Ok(SyncStats::default())
    }

    fn rebuild(&self) -> Result<SyncStats> {
        Ok(SyncStats::default())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
