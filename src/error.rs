use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskdownError {
    #[error("not a taskdown workspace (initialize one first)")]
    NotInitialized,

    #[error("taskdown already initialized in this directory")]
    AlreadyInitialized,

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("malformed task record '{path}': {reason}")]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("task {0} cannot be closed: {1}")]
    CloseBlocked(u64, String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl TaskdownError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::TaskNotFound(_) => "task_not_found",
            Self::Validation(_) => "validation",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::CloseBlocked(_, _) => "close_blocked",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Yaml(_) => "yaml_error",
            Self::Db(_) => "db_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskdownError>;
