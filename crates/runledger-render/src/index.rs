use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

/// One history record as the renderers see it, lifted out of an NDJSON
/// line. Hypothesis records surface their claim as the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub timestamp: String,
    pub record_type: String,
    pub id: String,
    pub status: String,
    pub summary: String,
    pub evidence: Vec<String>,
}

/// Parse serialized history text into rows, skipping lines that do not
/// parse; rendering is derived output and never the place to fail a build.
pub fn parse_history_rows(text: &str) -> Vec<HistoryRow> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        let summary = string_field(&value, "summary");
        let claim = string_field(&value, "claim");
        rows.push(HistoryRow {
            timestamp: string_field(&value, "timestamp"),
            record_type: string_field(&value, "record_type"),
            id: string_field(&value, "id"),
            status: string_field(&value, "status"),
            summary: if summary.is_empty() { claim } else { summary },
            evidence: value
                .get("evidence")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        });
    }
    rows
}

struct RunDigest {
    status: String,
    summary: String,
    evidence: BTreeSet<String>,
}

/// The per-run index table. Hypothesis rows set the run's status and
/// summary; journal rows contribute evidence links; agenda rows are
/// standing items and stay out of the run grouping.
pub fn render_history_index(rows: &[HistoryRow], history_dir: &str) -> String {
    let mut runs: BTreeMap<String, RunDigest> = BTreeMap::new();
    for row in rows {
        if row.timestamp.is_empty() || row.timestamp == "unknown" {
            continue;
        }
        let digest = runs.entry(row.timestamp.clone()).or_insert_with(|| RunDigest {
            status: "SUCCESS".to_string(),
            summary: String::new(),
            evidence: BTreeSet::new(),
        });
        match row.record_type.as_str() {
            "hypothesis" => {
                if !row.status.is_empty() {
                    digest.status = row.status.clone();
                }
                digest.summary = row.summary.clone();
                digest.evidence.extend(row.evidence.iter().cloned());
            }
            "journal" => {
                digest.evidence.extend(row.evidence.iter().cloned());
            }
            _ => {}
        }
    }

    let mut lines = vec![
        "# Execution History".to_string(),
        String::new(),
        "This file tracks all execution runs in chronological order.".to_string(),
        String::new(),
        "| Run ID | Timestamp | Status | Summary | Evidence |".to_string(),
        "| :--- | :--- | :--- | :--- | :--- |".to_string(),
    ];
    for (timestamp, digest) in &runs {
        let links: Vec<String> = digest
            .evidence
            .iter()
            .map(|entry| {
                let name = entry.rsplit('/').next().unwrap_or(entry);
                format!("[{name}]({})", relative_to(history_dir, entry))
            })
            .collect();
        let summary = digest.summary.replace('|', "\\|");
        lines.push(format!(
            "| {timestamp} | {timestamp} | {} | {summary} | {} |",
            digest.status.to_uppercase(),
            links.join(", ")
        ));
    }

    format!("{}\n", lines.join("\n").trim_end())
}

// Lexical relative path from one repo-relative directory to a target.
fn relative_to(dir: &str, target: &str) -> String {
    let dir_parts: Vec<&str> = dir.split('/').filter(|part| !part.is_empty()).collect();
    let target_parts: Vec<&str> = target.split('/').filter(|part| !part.is_empty()).collect();

    let common = dir_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = Vec::new();
    for _ in common..dir_parts.len() {
        parts.push("..");
    }
    parts.extend(&target_parts[common..]);
    parts.join("/")
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
