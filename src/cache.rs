//! On-disk JSON cache.
//!
//! One file per fetched entity, at a path derived purely from the term and
//! the course or department identifier. Existence is the only tracked
//! state: a write either lands, skips an existing file, or overwrites it
//! under `force`. There is no versioning and no merge; last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// What a cache write actually did. Callers decide how loudly to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    SkippedExisting,
    Overwritten,
}

/// `<out>/evals/<term>/<term>-<courseId>.json`
pub fn eval_path(out_dir: &Path, term: &str, course_id: &str) -> PathBuf {
    out_dir
        .join("evals")
        .join(term)
        .join(format!("{}-{}.json", term, course_id))
}

/// `<out>/courses/<term>/<term>-<dept>.json`
pub fn dept_courses_path(out_dir: &Path, term: &str, dept: &str) -> PathBuf {
    out_dir
        .join("courses")
        .join(term)
        .join(format!("{}-{}.json", term, dept))
}

/// `<out>/details/<term>/<term>-<courseId>.json`
pub fn course_detail_path(out_dir: &Path, term: &str, course_id: &str) -> PathBuf {
    out_dir
        .join("details")
        .join(term)
        .join(format!("{}-{}.json", term, course_id))
}

/// Persist `value` as pretty-printed JSON at `path`.
///
/// Parent directories are created as needed. An existing file is skipped
/// unless `force` is set; neither case is an error. Filesystem failures
/// (permissions, disk full) propagate.
pub fn write_json<T: Serialize>(path: &Path, value: &T, force: bool) -> Result<WriteOutcome> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
    }

    let existed = path.exists();
    if existed && !force {
        return Ok(WriteOutcome::SkippedExisting);
    }

    let body = to_pretty_json(value)?;
    fs::write(path, body)
        .with_context(|| format!("Failed to write cache file: {}", path.display()))?;

    Ok(if existed {
        WriteOutcome::Overwritten
    } else {
        WriteOutcome::Written
    })
}

// Cache files use a 4-space indent; serde_json's default pretty printer
// uses 2, so the formatter is set up by hand.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("Failed to serialize cache payload")?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_eval_path_layout() {
        let path = eval_path(Path::new("out"), "1244", "002051");
        assert_eq!(path, PathBuf::from("out/evals/1244/1244-002051.json"));
    }

    #[test]
    fn test_courses_and_details_path_layout() {
        assert_eq!(
            dept_courses_path(Path::new("out"), "1244", "COS"),
            PathBuf::from("out/courses/1244/1244-COS.json")
        );
        assert_eq!(
            course_detail_path(Path::new("out"), "1244", "002051"),
            PathBuf::from("out/details/1244/1244-002051.json")
        );
    }

    #[test]
    fn test_write_creates_parents_and_indents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("evals/1244/1244-002051.json");

        let outcome = write_json(&path, &json!({"a": 1}), false).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("    \"a\": 1"));
    }

    #[test]
    fn test_skip_leaves_first_write_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("entry.json");

        write_json(&path, &json!({"v": "first"}), false).unwrap();
        let outcome = write_json(&path, &json!({"v": "second"}), false).unwrap();
        assert_eq!(outcome, WriteOutcome::SkippedExisting);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("first"));
        assert!(!content.contains("second"));
    }

    #[test]
    fn test_force_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("entry.json");

        write_json(&path, &json!({"v": "first"}), false).unwrap();
        let outcome = write_json(&path, &json!({"v": "second"}), true).unwrap();
        assert_eq!(outcome, WriteOutcome::Overwritten);

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("first"));
        assert!(content.contains("second"));
    }
}
