use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::evidence::normalize_evidence;
use crate::record::HypothesisRecord;

pub const PLAN_FILENAME: &str = "implementation_plan.json";

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Failed to read plan {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse plan {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Plan {path} is not a JSON object")]
    NotAnObject { path: PathBuf },
}

/// Parse a run's plan document into hypothesis fragments. The plan is an
/// authoritative machine-generated source, so a malformed document is fatal
/// for the invocation; a missing one contributes nothing.
pub fn parse_plan(run_dir: &Path, repo_root: &Path) -> Result<Vec<HypothesisRecord>, PlanError> {
    let path = run_dir.join(PLAN_FILENAME);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(&path).map_err(|source| PlanError::Io {
        path: path.clone(),
        source,
    })?;
    let data: Value = serde_json::from_str(&text).map_err(|source| PlanError::Parse {
        path: path.clone(),
        source,
    })?;
    let Some(object) = data.as_object() else {
        return Err(PlanError::NotAnObject { path });
    };

    let run_name = run_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let items = object
        .get("items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut records = Vec::new();
    for item in items {
        let Some(id) = item.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) else {
            continue;
        };
        let claim = item.get("hypothesis").and_then(Value::as_str).unwrap_or("");
        let status = item.get("status").and_then(Value::as_str);
        let evidence: BTreeSet<String> = item
            .get("evidence")
            .and_then(|evidence| evidence.get("required_artifacts"))
            .and_then(Value::as_array)
            .map(|artifacts| {
                artifacts
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|entry| normalize_evidence(entry, repo_root))
                    .collect()
            })
            .unwrap_or_default();

        records.push(HypothesisRecord::fragment(
            id,
            claim,
            status,
            &run_name,
            evidence.into_iter().collect(),
        ));
    }
    Ok(records)
}

/// One-line description of the plan for the journal generator.
pub fn summarize_plan(run_dir: &Path) -> String {
    let path = run_dir.join(PLAN_FILENAME);
    if !path.exists() {
        return "I had no plan, behaving purely reactively.".to_string();
    }
    let parsed = fs::read_to_string(&path)
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok());
    let Some(data) = parsed else {
        return "I had a plan, but it was indecipherable.".to_string();
    };
    let items = data.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
    if items.is_empty() {
        return "I had an empty plan.".to_string();
    }
    let first = items[0]
        .get("hypothesis")
        .and_then(Value::as_str)
        .unwrap_or("something unknown");
    format!(
        "I set out to test {} hypotheses, starting with '{}'.",
        items.len(),
        first
    )
}
