//! SQLite-backed task index.
//!
//! Derived state only: a projection of each task file plus the file's mtime
//! and size for staleness checks. Deleting `index.db` loses nothing; the
//! next sync rebuilds it from the task files.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::error::Result;
use crate::model::Task;
use crate::store::TaskFilter;

/// Stat fingerprint of an indexed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub path: PathBuf,
    pub mtime_ns: i64,
    pub size: u64,
}

pub struct Index {
    conn: Connection,
}

impl Index {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let idx = Self { conn };
        idx.create_tables()?;
        Ok(idx)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let idx = Self { conn };
        idx.create_tables()?;
        Ok(idx)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT '',
                priority TEXT NOT NULL DEFAULT '',
                milestone TEXT,
                parent_task INTEGER,
                path TEXT NOT NULL,
                mtime_ns INTEGER NOT NULL,
                size INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS assignees (
                task_id INTEGER NOT NULL,
                assignee TEXT NOT NULL,
                PRIMARY KEY (task_id, assignee)
            );
            CREATE TABLE IF NOT EXISTS labels (
                task_id INTEGER NOT NULL,
                label TEXT NOT NULL,
                PRIMARY KEY (task_id, label)
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_task);
            CREATE INDEX IF NOT EXISTS idx_tasks_milestone ON tasks(milestone);",
        )?;
        Ok(())
    }

    pub fn upsert(&self, task: &Task, meta: &FileMeta) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO tasks (id, title, status, priority, milestone, parent_task, path, mtime_ns, size)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.id,
                task.title,
                task.status,
                task.priority,
                task.milestone,
                task.parent_task,
                meta.path.to_string_lossy(),
                meta.mtime_ns,
                meta.size,
            ],
        )?;
        tx.execute("DELETE FROM assignees WHERE task_id = ?1", params![task.id])?;
        for assignee in &task.assignees {
            tx.execute(
                "INSERT OR IGNORE INTO assignees (task_id, assignee) VALUES (?1, ?2)",
                params![task.id, assignee],
            )?;
        }
        tx.execute("DELETE FROM labels WHERE task_id = ?1", params![task.id])?;
        for label in &task.labels {
            tx.execute(
                "INSERT OR IGNORE INTO labels (task_id, label) VALUES (?1, ?2)",
                params![task.id, label],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn remove(&self, id: u64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM assignees WHERE task_id = ?1", params![id])?;
        tx.execute("DELETE FROM labels WHERE task_id = ?1", params![id])?;
        tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM labels; DELETE FROM assignees; DELETE FROM tasks;")?;
        Ok(())
    }

    /// Candidate ids for a filter, ascending. Membership filters go through
    /// the side tables; everything else is a column comparison.
    pub fn ids_matching(&self, filter: &TaskFilter) -> Result<Vec<u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id FROM tasks t
             WHERE (?1 IS NULL OR t.status = ?1)
             AND (?2 IS NULL OR t.priority = ?2)
             AND (?3 IS NULL OR EXISTS (
                 SELECT 1 FROM assignees a WHERE a.task_id = t.id AND a.assignee = ?3
             ))
             AND (?4 IS NULL OR EXISTS (
                 SELECT 1 FROM labels l WHERE l.task_id = t.id AND l.label = ?4
             ))
             AND (?5 IS NULL OR t.milestone = ?5)
             AND (?6 IS NULL OR t.parent_task = ?6)
             ORDER BY t.id",
        )?;
        let ids = stmt
            .query_map(
                params![
                    filter.status,
                    filter.priority,
                    filter.assignee,
                    filter.label,
                    filter.milestone,
                    filter.parent,
                ],
                |row| row.get(0),
            )?
            .collect::<std::result::Result<Vec<u64>, _>>()?;
        Ok(ids)
    }

    pub fn path_of(&self, id: u64) -> Result<Option<PathBuf>> {
        let mut stmt = self.conn.prepare("SELECT path FROM tasks WHERE id = ?1")?;
        match stmt.query_row(params![id], |row| row.get::<_, String>(0)) {
            Ok(path) => Ok(Some(PathBuf::from(path))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every indexed file with its stat fingerprint.
    pub fn entries(&self) -> Result<Vec<(u64, FileMeta)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path, mtime_ns, size FROM tasks ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    FileMeta {
                        path: PathBuf::from(row.get::<_, String>(1)?),
                        mtime_ns: row.get(2)?,
                        size: row.get(3)?,
                    },
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn max_id(&self) -> Result<u64> {
        let max: u64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(id), 0) FROM tasks", [], |row| {
                row.get(0)
            })?;
        Ok(max)
    }
}
