use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::paths::LedgerPaths;

/// One line in the append-only activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub event_id: String,
    pub timestamp: String,
    pub action: String,
    #[serde(default)]
    pub details: Value,
}

impl ActivityEvent {
    pub fn new(action: &str, details: Value) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            timestamp: now_local(),
            action: action.to_string(),
            details,
        }
    }
}

pub fn now_local() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn activity_log_path(repo_root: &Path, paths: &LedgerPaths) -> PathBuf {
    repo_root.join(&paths.activity_log)
}

pub fn append_activity_event(
    repo_root: &Path,
    paths: &LedgerPaths,
    event: &ActivityEvent,
) -> Result<()> {
    let path = activity_log_path(repo_root, paths);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create activity log dir under {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open activity log {}", path.display()))?;
    let line = serde_json::to_string(event).context("serialize activity event")?;
    writeln!(file, "{}", line).with_context(|| format!("append to {}", path.display()))?;
    Ok(())
}
