//! Workspace layout and task file naming.
//!
//! ```text
//! <root>/.taskdown/
//!   config.json
//!   tasks/task-<id>-<slug>.md
//!   cache/index.db
//! ```

use std::path::{Path, PathBuf};

pub const WORKSPACE_DIR: &str = ".taskdown";

const SLUG_MAX_LEN: usize = 48;

pub fn workspace_dir(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    workspace_dir(root).join("config.json")
}

pub fn tasks_dir(root: &Path) -> PathBuf {
    workspace_dir(root).join("tasks")
}

pub fn cache_dir(root: &Path) -> PathBuf {
    workspace_dir(root).join("cache")
}

pub fn index_path(root: &Path) -> PathBuf {
    cache_dir(root).join("index.db")
}

/// Lowercased, filesystem-safe slug: alphanumerics kept, every other run of
/// characters becomes a single hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}

pub fn task_file_name(id: u64, title: &str) -> String {
    format!("task-{}-{}.md", id, slugify(title))
}

pub fn task_path(root: &Path, id: u64, title: &str) -> PathBuf {
    tasks_dir(root).join(task_file_name(id, title))
}

/// Extract the task id from a `task-<id>-<slug>.md` file name.
pub fn parse_task_file_name(name: &str) -> Option<u64> {
    let rest = name.strip_prefix("task-")?;
    let rest = rest.strip_suffix(".md")?;
    let id_part = match rest.find('-') {
        Some(pos) => &rest[..pos],
        None => rest,
    };
    id_part.parse().ok()
}

/// Walk up from `start` looking for a directory containing `.taskdown/`.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if workspace_dir(current).is_dir() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_flattens_punctuation_and_case() {
        assert_eq!(slugify("Fix: the Parser!"), "fix-the-parser");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("über-cool"), "ber-cool");
    }

    #[test]
    fn slugify_never_returns_empty() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("!!!"), "untitled");
    }

    #[test]
    fn slugify_truncates_long_titles() {
        let long = "x".repeat(200);
        assert!(slugify(&long).len() <= SLUG_MAX_LEN);
    }

    #[test]
    fn file_name_round_trips_the_id() {
        let name = task_file_name(42, "Fix the parser");
        assert_eq!(name, "task-42-fix-the-parser.md");
        assert_eq!(parse_task_file_name(&name), Some(42));
    }

    #[test]
    fn parse_rejects_foreign_files() {
        assert_eq!(parse_task_file_name("notes.md"), None);
        assert_eq!(parse_task_file_name("task-abc-x.md"), None);
        assert_eq!(parse_task_file_name("task-7-x.txt"), None);
    }

    #[test]
    fn find_root_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(workspace_dir(dir.path())).unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn find_root_fails_outside_a_workspace() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_root(dir.path()), None);
    }
}
