//! Index-accelerated repository.
//!
//! Task files stay authoritative; the SQLite index is a cache kept fresh by
//! an incremental stat-compare sync. Every read path re-syncs first, so
//! out-of-band edits and deletes are picked up without a full rebuild.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, warn};

use crate::codec;
use crate::error::{Result, TaskdownError};
use crate::model::Task;
use crate::store::index::{FileMeta, Index};
use crate::store::paths;
use crate::store::{Repository, SyncStats, TaskFilter};

pub struct IndexedRepository {
    root: PathBuf,
    index: RefCell<Option<Index>>,
}

impl IndexedRepository {
    pub fn open(root: &Path) -> Result<Self> {
        let repo = Self {
            root: root.to_path_buf(),
            index: RefCell::new(None),
        };
        repo.with_index(|_| Ok(()))?;
        Ok(repo)
    }

    fn with_index<T>(&self, f: impl FnOnce(&Index) -> Result<T>) -> Result<T> {
        let mut guard = self.index.borrow_mut();
        match &mut *guard {
            Some(idx) => f(idx),
            slot @ None => {
                fs::create_dir_all(paths::cache_dir(&self.root))?;
                f(slot.insert(Index::open(&paths::index_path(&self.root))?))
            }
        }
    }

    fn stat_meta(path: &Path) -> Result<FileMeta> {
        let md = fs::metadata(path)?;
        let mtime_ns = md
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        Ok(FileMeta {
            path: path.to_path_buf(),
            mtime_ns,
            size: md.len(),
        })
    }

    fn list_disk_files(&self) -> Result<Vec<(u64, FileMeta)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(paths::tasks_dir(&self.root))? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = paths::parse_task_file_name(name) {
                files.push((id, Self::stat_meta(&entry.path())?));
            }
        }
        Ok(files)
    }

    /// Bring the index up to date with the task directory. Only files that
    /// are new, renamed, or whose stat fingerprint changed get re-decoded.
    fn sync_inner(&self, idx: &Index) -> Result<SyncStats> {
        let disk = self.list_disk_files()?;
        let known: HashMap<u64, FileMeta> = idx.entries()?.into_iter().collect();

        let mut stats = SyncStats {
            scanned: disk.len(),
            ..Default::default()
        };

        for (id, meta) in &disk {
            let changed = match known.get(id) {
                None => true,
                Some(k) => {
                    meta.mtime_ns > k.mtime_ns || meta.size != k.size || meta.path != k.path
                }
            };
            if !changed {
                continue;
            }
            match fs::read_to_string(&meta.path).map_err(TaskdownError::from).and_then(|raw| codec::decode(&raw, &meta.path)) {
                Ok(task) => {
                    idx.upsert(&task, meta)?;
                    stats.decoded += 1;
                }
                Err(e) => {
                    warn!(path = %meta.path.display(), error = %e, "skipping unreadable task file");
                    idx.remove(*id)?;
                    stats.skipped += 1;
                }
            }
        }

        let disk_ids: HashSet<u64> = disk.iter().map(|(id, _)| *id).collect();
        for id in known.keys() {
            if !disk_ids.contains(id) {
                idx.remove(*id)?;
                stats.removed += 1;
            }
        }

        Ok(stats)
    }

    fn write_through(&self, task: &Task, create_new: bool) -> Result<()> {
        let path = task
            .path
            .as_ref()
            .ok_or_else(|| TaskdownError::Validation("task has no storage path".into()))?;
        let content = codec::encode(task)?;
        if create_new {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)?;
            file.write_all(content.as_bytes())?;
        } else {
            fs::write(path, content)?;
        }
        // File is committed; an index failure here heals on the next sync.
        let meta = Self::stat_meta(path)?;
        self.with_index(|idx| idx.upsert(task, &meta))
    }
}

impl Repository for IndexedRepository {
    fn query(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.with_index(|idx| {
            self.sync_inner(idx)?;
            let ids = idx.ids_matching(filter)?;
            let mut tasks = Vec::with_capacity(ids.len());
            for id in ids {
                let Some(path) = idx.path_of(id)? else {
                    continue;
                };
                match fs::read_to_string(&path)
                    .map_err(TaskdownError::from)
                    .and_then(|raw| codec::decode(&raw, &path))
                {
                    Ok(task) => tasks.push(task),
                    Err(e) => {
                        warn!(id, error = %e, "skipping task that failed to hydrate");
                    }
                }
            }
            Ok(tasks)
        })
    }

    fn fetch(&self, id: u64) -> Result<Option<Task>> {
        self.with_index(|idx| {
            self.sync_inner(idx)?;
            match idx.path_of(id)? {
                Some(path) => {
                    let raw = fs::read_to_string(&path)?;
                    Ok(Some(codec::decode(&raw, &path)?))
                }
                None => Ok(None),
            }
        })
    }

    fn create(&self, task: &Task) -> Result<()> {
        self.write_through(task, true)
    }

    fn update(&self, task: &Task) -> Result<()> {
        self.write_through(task, false)
    }

    fn delete(&self, id: u64) -> Result<()> {
        self.with_index(|idx| {
            self.sync_inner(idx)?;
            let path = idx.path_of(id)?;
            // Index row first: if the file removal fails the next sync
            // re-adds the row instead of serving a ghost.
            idx.remove(id)?;
            if let Some(path) = path
                && path.exists()
            {
                fs::remove_file(path)?;
            }
            Ok(())
        })
    }

    fn next_id(&self) -> Result<u64> {
        self.with_index(|idx| {
            self.sync_inner(idx)?;
            Ok(idx.max_id()? + 1)
        })
    }

    fn sync(&self) -> Result<SyncStats> {
        self.with_index(|idx| self.sync_inner(idx))
    }

    fn rebuild(&self) -> Result<SyncStats> {
        debug!("rebuilding task index from scratch");
        self.with_index(|idx| {
            idx.clear()?;
            self.sync_inner(idx)
        })
    }

    fn close(&self) -> Result<()> {
        self.index.borrow_mut().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> (tempfile::TempDir, IndexedRepository) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(paths::tasks_dir(dir.path())).unwrap();
        fs::create_dir_all(paths::cache_dir(dir.path())).unwrap();
        let repo = IndexedRepository::open(dir.path()).unwrap();
        (dir, repo)
    }

    fn stored(repo: &IndexedRepository, id: u64, title: &str, status: &str) -> Task {
        let mut task = Task::new(id, title, status);
        task.path = Some(paths::task_path(&repo.root, id, title));
        repo.create(&task).unwrap();
        task
    }

    #[test]
    fn create_then_query_round_trips() {
        let (_dir, repo) = arena();
        stored(&repo, 1, "First", "To Do");
        stored(&repo, 2, "Second", "Done");

        let all = repo.query(&TaskFilter::default()).unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);

        let done = repo
            .query(&TaskFilter {
                status: Some("Done".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].title, "Second");
    }

    #[test]
    fn out_of_band_edit_is_picked_up() {
        let (_dir, repo) = arena();
        let task = stored(&repo, 1, "First", "To Do");
        let path = task.path.clone().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        fs::write(&path, raw.replace("To Do", "In Progress with more bytes")).unwrap();

        let fetched = repo.fetch(1).unwrap().unwrap();
        assert_eq!(fetched.status, "In Progress with more bytes");
    }

    #[test]
    fn out_of_band_delete_drops_the_row() {
        let (_dir, repo) = arena();
        let task = stored(&repo, 1, "First", "To Do");
        fs::remove_file(task.path.unwrap()).unwrap();

        let stats = repo.sync().unwrap();
        assert_eq!(stats.removed, 1);
        assert!(repo.fetch(1).unwrap().is_none());
    }

    #[test]
    fn incremental_sync_decodes_only_changed_files() {
        let (_dir, repo) = arena();
        let a = stored(&repo, 1, "A", "To Do");
        stored(&repo, 2, "B", "To Do");
        stored(&repo, 3, "C", "To Do");

        let quiet = repo.sync().unwrap();
        assert_eq!(quiet.scanned, 3);
        assert_eq!(quiet.decoded, 0);

        let path = a.path.unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        fs::write(&path, raw.replace("To Do", "Done and longer")).unwrap();

        let stats = repo.sync().unwrap();
        assert_eq!(stats.scanned, 3);
        assert_eq!(stats.decoded, 1);
    }

    #[test]
    fn corrupt_file_is_logged_and_skipped() {
        let (_dir, repo) = arena();
        stored(&repo, 1, "Good", "To Do");
        fs::write(
            paths::tasks_dir(&repo.root).join("task-2-broken.md"),
            "not a task record",
        )
        .unwrap();

        let stats = repo.sync().unwrap();
        assert_eq!(stats.skipped, 1);

        let all = repo.query(&TaskFilter::default()).unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn rebuild_recovers_from_a_deleted_cache() {
        let (dir, repo) = arena();
        stored(&repo, 1, "First", "To Do");
        repo.close().unwrap();
        fs::remove_dir_all(paths::cache_dir(dir.path())).unwrap();

        let repo = IndexedRepository::open(dir.path()).unwrap();
        let stats = repo.rebuild().unwrap();
        assert_eq!(stats.decoded, 1);
        assert!(repo.fetch(1).unwrap().is_some());
    }

    #[test]
    fn next_id_follows_the_highest_file() {
        let (_dir, repo) = arena();
        assert_eq!(repo.next_id().unwrap(), 1);
        stored(&repo, 1, "A", "To Do");
        stored(&repo, 9, "I", "To Do");
        assert_eq!(repo.next_id().unwrap(), 10);
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let (_dir, repo) = arena();
        let task = stored(&repo, 1, "First", "To Do");
        let err = repo.create(&task).unwrap_err();
        assert_eq!(err.code(), "io_error");
    }

    #[test]
    fn close_is_idempotent_and_reopens_on_use() {
        let (_dir, repo) = arena();
        stored(&repo, 1, "First", "To Do");
        repo.close().unwrap();
        repo.close().unwrap();
        assert!(repo.fetch(1).unwrap().is_some());
    }

    #[test]
    fn delete_removes_file_and_row() {
        let (_dir, repo) = arena();
        let task = stored(&repo, 1, "First", "To Do");
        repo.delete(1).unwrap();
        assert!(!task.path.unwrap().exists());
        assert!(repo.fetch(1).unwrap().is_none());
        repo.delete(1).unwrap();
    }
}
