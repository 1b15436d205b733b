use std::path::{Path, PathBuf};

/// Repo-relative locations of every artifact the engine reads or writes.
///
/// Two layouts exist in the wild: the current `artifacts/` tree and the
/// older `docs/exec/` tree. Parsers and the store take this struct plus an
/// explicit repo root; nothing consults the current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPaths {
    pub runs_dir: String,
    pub history_file: String,
    pub narrative_file: String,
    pub index_file: String,
    pub timeline_file: String,
    pub agenda_file: String,
    pub journal_dir: String,
    pub lessons_file: String,
    pub activity_log: String,
}

impl LedgerPaths {
    pub fn artifacts_layout() -> Self {
        Self {
            runs_dir: "artifacts/history/runs".to_string(),
            history_file: "artifacts/history/history.ndjson".to_string(),
            narrative_file: "artifacts/history/deep-thoughts.md".to_string(),
            index_file: "artifacts/history/history.md".to_string(),
            timeline_file: "artifacts/history/timeline.md".to_string(),
            agenda_file: "artifacts/history/agenda_state.json".to_string(),
            journal_dir: "artifacts/journal".to_string(),
            lessons_file: "artifacts/history/lessons-learned.md".to_string(),
            activity_log: "artifacts/agent_activity.jsonl".to_string(),
        }
    }

    pub fn docs_exec_layout() -> Self {
        Self {
            runs_dir: "docs/exec/runs".to_string(),
            history_file: "docs/exec/history.ndjson".to_string(),
            narrative_file: "docs/exec/deep-thoughts.md".to_string(),
            index_file: "docs/exec/history.md".to_string(),
            timeline_file: "docs/exec/timeline.md".to_string(),
            agenda_file: "docs/exec/agenda_state.json".to_string(),
            journal_dir: "artifacts/journal".to_string(),
            lessons_file: "docs/exec/lessons-learned.md".to_string(),
            activity_log: "artifacts/agent_activity.jsonl".to_string(),
        }
    }

    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "artifacts" => Some(Self::artifacts_layout()),
            "docs-exec" | "legacy" => Some(Self::docs_exec_layout()),
            _ => None,
        }
    }

    pub fn runs_root(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.runs_dir)
    }

    pub fn history_path(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.history_file)
    }

    pub fn agenda_path(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.agenda_file)
    }

    pub fn journal_root(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.journal_dir)
    }
}

impl Default for LedgerPaths {
    fn default() -> Self {
        Self::artifacts_layout()
    }
}
