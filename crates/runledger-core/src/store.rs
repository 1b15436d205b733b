use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::agenda::{parse_agenda, AgendaError};
use crate::journal::{journal_record, load_journal_entries};
use crate::merge::fold_record;
use crate::paths::LedgerPaths;
use crate::plan::{parse_plan, PlanError};
use crate::record::{from_line, to_line, HistoryRecord, RecordKind};
use crate::report::parse_report;
use crate::walkthrough::parse_walkthrough;

/// How to treat a persisted log line that does not parse. The log is
/// append-only history, so the default skips a corrupt line rather than
/// blocking every future reconciliation on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Lenient,
    Strict,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Agenda(#[from] AgendaError),
    #[error("Failed to read history {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed history line {line} in {path}: {source}")]
    CorruptLine {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("Failed to serialize history record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub history_path: PathBuf,
    pub records: usize,
    pub changed: bool,
    pub digest: String,
}

/// Load the persisted log. An absent file is an empty log, never an error.
pub fn load_history(path: &Path, strictness: Strictness) -> Result<Vec<HistoryRecord>, ReconcileError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ReconcileError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match from_line(line) {
            Ok(record) => records.push(record),
            Err(source) => match strictness {
                Strictness::Lenient => continue,
                Strictness::Strict => {
                    return Err(ReconcileError::CorruptLine {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        source,
                    })
                }
            },
        }
    }
    Ok(records)
}

/// Rebuild the full record set: persisted log as "existing", the current
/// artifact scan as "incoming", journal records overlaid wholesale by
/// timestamp key. Output order is total and stable.
pub fn collect_records(
    repo_root: &Path,
    paths: &LedgerPaths,
    history_path: &Path,
    strictness: Strictness,
) -> Result<Vec<HistoryRecord>, ReconcileError> {
    let existing = load_history(history_path, strictness)?;

    let mut journals: BTreeMap<String, HistoryRecord> = BTreeMap::new();
    let mut merged: BTreeMap<(RecordKind, String), HistoryRecord> = BTreeMap::new();
    for record in existing {
        match record {
            HistoryRecord::Journal(journal) => {
                journals.insert(journal.timestamp.clone(), HistoryRecord::Journal(journal));
            }
            other => fold_record(&mut merged, other),
        }
    }

    for record in scan_runs(repo_root, paths)? {
        fold_record(&mut merged, record);
    }
    for record in parse_agenda(&paths.agenda_path(repo_root), repo_root)? {
        fold_record(&mut merged, HistoryRecord::Agenda(record));
    }

    // A regenerated journal entry replaces the persisted record with the
    // same key; entries whose file disappeared are retained.
    for entry in load_journal_entries(repo_root, paths) {
        journals.insert(
            entry.run_id.clone(),
            HistoryRecord::Journal(journal_record(&entry)),
        );
    }

    let mut records: Vec<HistoryRecord> = merged.into_values().chain(journals.into_values()).collect();
    records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    Ok(records)
}

// Every immediate subdirectory of the runs root is a run, visited in
// ascending name order so later runs merge after earlier ones.
fn scan_runs(repo_root: &Path, paths: &LedgerPaths) -> Result<Vec<HistoryRecord>, ReconcileError> {
    let runs_root = paths.runs_root(repo_root);
    let Ok(read_dir) = fs::read_dir(&runs_root) else {
        return Ok(Vec::new());
    };

    let mut run_dirs: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    run_dirs.sort();

    let mut records = Vec::new();
    for run_dir in run_dirs {
        for record in parse_plan(&run_dir, repo_root)? {
            records.push(HistoryRecord::Hypothesis(record));
        }
        for record in parse_walkthrough(&run_dir, repo_root) {
            records.push(HistoryRecord::Hypothesis(record));
        }
        for record in parse_report(&run_dir, repo_root) {
            records.push(HistoryRecord::Hypothesis(record));
        }
    }
    Ok(records)
}

/// NDJSON, trailing newline when non-empty, exact empty string otherwise.
pub fn serialize_records(records: &[HistoryRecord]) -> Result<String, ReconcileError> {
    let mut lines = Vec::with_capacity(records.len());
    for record in records {
        lines.push(to_line(record)?);
    }
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    Ok(text)
}

/// Byte-for-byte comparison against the on-disk content, treating a
/// missing file as empty.
pub fn would_change(path: &Path, content: &str) -> Result<bool, std::io::Error> {
    match fs::read_to_string(path) {
        Ok(existing) => Ok(existing != content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(!content.is_empty()),
        Err(err) => Err(err),
    }
}

pub fn write_output(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Full reconciliation of the history log. Check mode never writes; write
/// mode writes only after the whole computation has succeeded.
pub fn reconcile(
    repo_root: &Path,
    paths: &LedgerPaths,
    strictness: Strictness,
    output: Option<&Path>,
    check_only: bool,
) -> Result<ReconcileOutcome, ReconcileError> {
    let history_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.history_path(repo_root));

    let records = collect_records(repo_root, paths, &history_path, strictness)?;
    let content = serialize_records(&records)?;
    let digest = content_digest(&content);
    let changed = would_change(&history_path, &content).map_err(|source| ReconcileError::Io {
        path: history_path.clone(),
        source,
    })?;

    if !check_only {
        write_output(&history_path, &content).map_err(|source| ReconcileError::Io {
            path: history_path.clone(),
            source,
        })?;
    }

    Ok(ReconcileOutcome {
        history_path,
        records: records.len(),
        changed,
        digest,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn serializing_no_records_is_the_empty_string() {
        assert_eq!(serialize_records(&[]).expect("serialize"), "");
    }

    #[test]
    fn would_change_treats_a_missing_file_as_empty() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("history.ndjson");
        assert!(!would_change(&path, "").expect("check"));
        assert!(would_change(&path, "line\n").expect("check"));
    }

    #[test]
    fn lenient_load_skips_corrupt_lines_and_strict_fails() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("history.ndjson");
        fs::write(
            &path,
            "{\"record_type\":\"hypothesis\",\"id\":\"HYP-0001\"}\n{broken\n",
        )
        .expect("write history");

        let records = load_history(&path, Strictness::Lenient).expect("lenient");
        assert_eq!(records.len(), 1);

        let err = load_history(&path, Strictness::Strict).expect_err("strict must fail");
        let message = err.to_string();
        assert!(message.contains("history.ndjson"));
        assert!(message.contains("line 2"));
    }

    #[test]
    fn digest_is_stable_for_equal_content() {
        assert_eq!(content_digest("abc"), content_digest("abc"));
        assert_ne!(content_digest("abc"), content_digest("abd"));
    }
}
