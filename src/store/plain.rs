//! Full-scan repository: every call walks the task directory and decodes
//! whatever it finds. No derived state, no staleness. This is the
//! correctness baseline the indexed backend is measured against.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::{Result, TaskdownError};
use crate::model::Task;
use crate::store::paths;
use crate::store::{Repository, TaskFilter};

pub struct PlainRepository {
    root: PathBuf,
}

impl PlainRepository {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn tasks_dir(&self) -> PathBuf {
        paths::tasks_dir(&self.root)
    }

    /// File paths of every task record, paired with the id taken from the
    /// file name.
    fn list_files(&self) -> Result<Vec<(u64, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(self.tasks_dir())? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = paths::parse_task_file_name(name) {
                files.push((id, entry.path()));
            }
        }
        files.sort_by_key(|(id, _)| *id);
        Ok(files)
    }

    fn decode_file(&self, path: &Path) -> Result<Task> {
        let raw = fs::read_to_string(path)?;
        codec::decode(&raw, path)
    }

    fn scan_all(&self) -> Result<Vec<Task>> {
        self.list_files()?
            .into_iter()
            .map(|(_, path)| self.decode_file(&path))
            .collect()
    }

    fn path_of(&self, id: u64) -> Result<Option<PathBuf>> {
        Ok(self
            .list_files()?
            .into_iter()
            .find(|(file_id, _)| *file_id == id)
            .map(|(_, path)| path))
    }
}

impl Repository for PlainRepository {
    fn query(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut tasks = self.scan_all()?;
        tasks.retain(|t| filter.matches(t));
        Ok(tasks)
    }

    fn fetch(&self, id: u64) -> Result<Option<Task>> {
        match self.path_of(id)? {
            Some(path) => Ok(Some(self.decode_file(&path)?)),
            None => Ok(None),
        }
    }

    fn create(&self, task: &Task) -> Result<()> {
        let path = task
            .path
            .as_ref()
            .ok_or_else(|| TaskdownError::Validation("task has no storage path".into()))?;
        let content = codec::encode(task)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn update(&self, task: &Task) -> Result<()> {
        let path = task
            .path
            .as_ref()
            .ok_or_else(|| TaskdownError::Validation("task has no storage path".into()))?;
        let content = codec::encode(task)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn delete(&self, id: u64) -> Result<()> {
        if let Some(path) = self.path_of(id)? {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn next_id(&self) -> Result<u64> {
        let max = self
            .list_files()?
            .into_iter()
            .map(|(id, _)| id)
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }
}
