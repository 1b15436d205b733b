use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::LedgerPaths;
use crate::record::JournalRecord;

/// One journal file: the stem is the timestamp key, the body is opaque to
/// the engine and only rendered, never parsed for fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub run_id: String,
    pub rel_path: String,
    pub body: String,
}

/// Scan the journal directory for markdown entries, ascending by stem.
/// A missing directory contributes nothing.
pub fn load_journal_entries(repo_root: &Path, paths: &LedgerPaths) -> Vec<JournalEntry> {
    let journal_root = paths.journal_root(repo_root);
    let Ok(read_dir) = fs::read_dir(&journal_root) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "md").unwrap_or(false))
        .collect();
    files.sort();

    let mut entries = Vec::new();
    for path in files {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let Ok(body) = fs::read_to_string(&path) else {
            continue;
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        entries.push(JournalEntry {
            run_id: stem.to_string(),
            rel_path: format!("{}/{}", paths.journal_dir, file_name),
            body,
        });
    }
    entries
}

pub fn journal_record(entry: &JournalEntry) -> JournalRecord {
    JournalRecord {
        timestamp: entry.run_id.clone(),
        summary: format!("Journal entry for {}", entry.run_id),
        evidence: vec![entry.rel_path.clone()],
        extra: BTreeMap::new(),
    }
}
