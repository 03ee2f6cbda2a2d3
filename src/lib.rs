//! Taskdown: file-backed task storage with an optional SQLite index.
//!
//! Each task lives in its own markdown file (YAML front matter plus a free
//! body) under `.taskdown/tasks/`. The files are the source of truth; the
//! index under `.taskdown/cache/` is derived state that any sync can
//! rebuild. [`Workspace`] is the entry point and keeps the bidirectional
//! relationship fields (dependencies and blocked-by, parent and subtasks)
//! consistent across files.

pub mod close;
pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod workspace;

pub use close::{
    BlockingIssue, BlockingKind, CloseSuggestions, CloseValidation, CloseWarning, WarningKind,
};
pub use config::{CloseChecksConfig, PerformanceConfig, WorkspaceConfig};
pub use error::{Result, TaskdownError};
pub use model::{AcceptanceCriterion, ChangelogEntry, Task, TaskDraft, TaskPatch};
pub use store::{Repository, SyncStats, TaskFilter};
pub use workspace::Workspace;
