//! Task record codec.
//!
//! A task file is YAML front matter between `---` delimiters followed by the
//! markdown description body:
//!
//! ```text
//! ---
//! id: 4
//! title: Ship the thing
//! ---
//!
//! Body text.
//! ```

use std::path::Path;

use crate::error::{Result, TaskdownError};
use crate::model::Task;

fn malformed(path: &Path, reason: impl Into<String>) -> TaskdownError {
    TaskdownError::MalformedRecord {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Parse raw file content into a task. Absent keys take their zero values;
/// structural problems (missing or unterminated front matter, YAML type
/// mismatches) are malformed records with no partial recovery.
pub fn decode(raw: &str, path: &Path) -> Result<Task> {
    let mut lines = raw.lines();
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return Err(malformed(path, "missing front matter opening delimiter")),
    }

    let mut front = String::new();
    let mut terminated = false;
    let mut body_lines: Vec<&str> = Vec::new();
    for line in lines.by_ref() {
        if line.trim_end() == "---" {
            terminated = true;
            break;
        }
        front.push_str(line);
        front.push('\n');
    }
    if !terminated {
        return Err(malformed(path, "unterminated front matter block"));
    }
    body_lines.extend(lines);

    let mut task: Task =
        serde_yaml::from_str(&front).map_err(|e| malformed(path, e.to_string()))?;

    task.description = body_lines.join("\n").trim().to_string();
    task.path = Some(path.to_path_buf());
    Ok(task)
}

/// Render a task back to file content. Only keys with a value appear in the
/// front matter; an empty description omits the body entirely.
pub fn encode(task: &Task) -> Result<String> {
    let yaml = serde_yaml::to_string(task)?;
    let mut out = String::with_capacity(yaml.len() + task.description.len() + 16);
    out.push_str("---\n");
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");
    let body = task.description.trim();
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    Ok(out)
}
