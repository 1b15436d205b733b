use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::paths::LedgerPaths;

/// Optional repo-local configuration. Every field is an override; absent
/// fields fall back to the selected layout's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Layout preset: "artifacts" (default) or "docs-exec".
    pub layout: Option<String>,
    pub runs_dir: Option<String>,
    pub history_file: Option<String>,
    pub narrative_file: Option<String>,
    pub index_file: Option<String>,
    pub timeline_file: Option<String>,
    pub agenda_file: Option<String>,
    pub journal_dir: Option<String>,
    pub lessons_file: Option<String>,
    pub activity_log: Option<String>,
}

pub fn config_filename_candidates() -> [&'static str; 2] {
    [".runledger.toml", ".runledgerrc"]
}

pub fn load_config(repo_root: &Path) -> Option<LedgerConfig> {
    for name in config_filename_candidates() {
        let path = repo_root.join(name);
        if path.is_file() {
            if let Ok(text) = fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str::<LedgerConfig>(&text) {
                    return Some(config);
                }
            }
        }
    }
    None
}

pub fn resolve_paths(repo_root: &Path) -> LedgerPaths {
    let Some(config) = load_config(repo_root) else {
        return LedgerPaths::default();
    };
    let mut paths = config
        .layout
        .as_deref()
        .and_then(LedgerPaths::named)
        .unwrap_or_default();

    apply(&mut paths.runs_dir, config.runs_dir);
    apply(&mut paths.history_file, config.history_file);
    apply(&mut paths.narrative_file, config.narrative_file);
    apply(&mut paths.index_file, config.index_file);
    apply(&mut paths.timeline_file, config.timeline_file);
    apply(&mut paths.agenda_file, config.agenda_file);
    apply(&mut paths.journal_dir, config.journal_dir);
    apply(&mut paths.lessons_file, config.lessons_file);
    apply(&mut paths.activity_log, config.activity_log);
    paths
}

fn apply(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *slot = trimmed.to_string();
        }
    }
}
