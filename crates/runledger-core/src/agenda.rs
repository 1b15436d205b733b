use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::evidence::normalize_evidence;
use crate::record::{normalize_status, AgendaRecord, UNKNOWN_RUN};

// Key names the snapshot's items list has lived under across schema
// versions; the first present wins.
const ITEM_KEYS: [&str; 3] = ["items", "agenda", "records"];

#[derive(Debug, Error)]
pub enum AgendaError {
    #[error("Failed to read agenda snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse agenda snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Agenda snapshot {path} is not a JSON object")]
    NotAnObject { path: PathBuf },
}

/// Parse the standing agenda snapshot into agenda fragments. The snapshot
/// is not run-scoped, so seen-run fields default to the unknown sentinel.
pub fn parse_agenda(
    snapshot_path: &Path,
    repo_root: &Path,
) -> Result<Vec<AgendaRecord>, AgendaError> {
    if !snapshot_path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(snapshot_path).map_err(|source| AgendaError::Io {
        path: snapshot_path.to_path_buf(),
        source,
    })?;
    let data: Value = serde_json::from_str(&text).map_err(|source| AgendaError::Parse {
        path: snapshot_path.to_path_buf(),
        source,
    })?;
    let Some(object) = data.as_object() else {
        return Err(AgendaError::NotAnObject {
            path: snapshot_path.to_path_buf(),
        });
    };

    let items = ITEM_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    let mut records = Vec::new();
    for item in items {
        let id = item
            .get("id")
            .or_else(|| item.get("hypothesis_id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());
        let Some(id) = id else {
            continue;
        };

        let summary = item.get("summary").and_then(Value::as_str).unwrap_or("");
        let status = item.get("status").and_then(Value::as_str).unwrap_or("");
        let first_seen_run = seen_run(&item, "first_seen_run");
        let last_seen_run = seen_run(&item, "last_seen_run");
        let evidence = normalize_item_evidence(item.get("evidence"), repo_root);

        records.push(AgendaRecord {
            id: id.to_string(),
            summary: summary.to_string(),
            status: normalize_status(status),
            first_seen_run,
            timestamp: last_seen_run.clone(),
            last_seen_run,
            evidence,
            extra: BTreeMap::new(),
        });
    }
    Ok(records)
}

fn seen_run(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(UNKNOWN_RUN)
        .to_string()
}

// Evidence appears as a single string or a list; both normalize the same.
fn normalize_item_evidence(evidence: Option<&Value>, repo_root: &Path) -> Vec<String> {
    let entries: Vec<&str> = match evidence {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(many)) => many.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let normalized: BTreeSet<String> = entries
        .into_iter()
        .filter_map(|entry| normalize_evidence(entry, repo_root))
        .collect();
    normalized.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write_snapshot(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("snapshot dir");
        fs::write(path, body).expect("write snapshot");
    }

    #[test]
    fn missing_snapshot_yields_nothing() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("history").join("agenda_state.json");
        let records = parse_agenda(&path, temp.path()).expect("parse");
        assert!(records.is_empty());
    }

    #[test]
    fn string_and_list_evidence_normalize_identically() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("agenda_state.json");
        write_snapshot(
            &path,
            r#"{"items": [
                {"id": "AG-0001", "summary": "Need data", "evidence": "docs/x.md"},
                {"id": "AG-0002", "summary": "Need more", "evidence": ["docs/x.md"]}
            ]}"#,
        );

        let records = parse_agenda(&path, temp.path()).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].evidence, vec!["docs/x.md"]);
        assert_eq!(records[0].evidence, records[1].evidence);
        assert_eq!(records[0].status, "active");
        assert_eq!(records[0].first_seen_run, "unknown");
        assert_eq!(records[0].last_seen_run, "unknown");
    }

    #[test]
    fn legacy_item_key_names_are_accepted() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("agenda_state.json");
        write_snapshot(
            &path,
            r#"{"agenda": [{"hypothesis_id": "HYP-0002", "summary": "Open", "status": "Blocked",
                           "first_seen_run": "run1", "last_seen_run": "run2"}]}"#,
        );

        let records = parse_agenda(&path, temp.path()).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "HYP-0002");
        assert_eq!(records[0].status, "blocked");
        assert_eq!(records[0].first_seen_run, "run1");
        assert_eq!(records[0].last_seen_run, "run2");
        assert_eq!(records[0].timestamp, "run2");
    }

    #[test]
    fn malformed_snapshot_is_fatal_and_names_the_path() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("agenda_state.json");
        write_snapshot(&path, "[]");

        let err = parse_agenda(&path, temp.path()).expect_err("must fail");
        assert!(matches!(err, AgendaError::NotAnObject { .. }));
        assert!(err.to_string().contains("agenda_state.json"));
    }
}
