use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths::LedgerPaths;

const LESSONS_HEADER: &str = "# Lessons Learned\n\n";

#[derive(Debug, Error)]
pub enum LessonsError {
    #[error("Failed to update lessons file: {0}")]
    Io(#[from] std::io::Error),
}

/// Append a run's lessons to the global lessons file under a per-run
/// heading, each entry titled and linked back to the walkthrough. The file
/// is append-only; nothing already recorded is rewritten.
pub fn append_lessons(
    repo_root: &Path,
    paths: &LedgerPaths,
    run_name: &str,
    lessons: &[String],
) -> Result<usize, LessonsError> {
    if lessons.is_empty() {
        return Ok(0);
    }

    let path = lessons_path(repo_root, paths);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs::write(&path, LESSONS_HEADER)?;
    }

    let existing = fs::read_to_string(&path)?;
    let mut block = String::new();
    if !existing.ends_with("\n\n") {
        block.push('\n');
    }
    block.push_str(&format!("\n## {run_name}\n"));
    for (idx, lesson) in lessons.iter().enumerate() {
        let clean = lesson.trim().trim_end_matches('.');
        let title = entry_title(clean);
        block.push_str(&format!("\n### {}. {title}\n", idx + 1));
        block.push_str(&format!("\n**Lesson**: {clean}.\n"));
        block.push_str(&format!(
            "\n**Evidence**: from [{run_name}](runs/{run_name}/walkthrough.md)\n"
        ));
    }

    let mut file = OpenOptions::new().append(true).open(&path)?;
    file.write_all(block.as_bytes())?;
    Ok(lessons.len())
}

pub fn lessons_path(repo_root: &Path, paths: &LedgerPaths) -> PathBuf {
    repo_root.join(&paths.lessons_file)
}

// First five words of the lesson, elided.
fn entry_title(lesson: &str) -> String {
    let words: Vec<&str> = lesson.split_whitespace().take(5).collect();
    format!("{}...", words.join(" "))
}
