use std::fs;
use std::path::Path;

use regex::Regex;

use crate::evidence::extract_repo_paths;
use crate::record::HypothesisRecord;

pub const REPORT_FILENAME: &str = "post_verify_report.md";

/// Parse a run's status report into at most one hypothesis fragment. A
/// report that cannot be tied to any hypothesis id carries no
/// reconciliation value and is dropped silently.
pub fn parse_report(run_dir: &Path, repo_root: &Path) -> Vec<HypothesisRecord> {
    let path = run_dir.join(REPORT_FILENAME);
    let Ok(text) = fs::read_to_string(&path) else {
        return Vec::new();
    };

    let Some(id) = hypothesis_id(&text) else {
        return Vec::new();
    };

    let claim_pattern = Regex::new(r"Hypothesis:\s*(.+)").expect("regex");
    let claim = claim_pattern
        .captures(&text)
        .map(|cap| cap[1].trim().to_string())
        .unwrap_or_default();
    let status_pattern = Regex::new(r"Status:\s*([A-Za-z\-]+)").expect("regex");
    let status = status_pattern.captures(&text).map(|cap| cap[1].to_string());

    let evidence = extract_repo_paths(&text, repo_root);
    let run_name = run_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    vec![HypothesisRecord::fragment(
        &id,
        &claim,
        status.as_deref(),
        &run_name,
        evidence,
    )]
}

/// Shorthand outcome line for the journal generator.
pub fn report_outcome(run_dir: &Path) -> String {
    let path = run_dir.join(REPORT_FILENAME);
    let Ok(text) = fs::read_to_string(&path) else {
        return "The run concluded without a final report.".to_string();
    };
    let status_pattern = Regex::new(r"Status:\s*([A-Za-z\-]+)").expect("regex");
    let status = status_pattern
        .captures(&text)
        .map(|cap| cap[1].to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!("The run finished with status '{status}'.")
}

// Run-id lines come in two generations: YYYY-MM-DD_HHMMSS and
// YYYY-MM-DD-HH-MM-SS, each with an optional -HYP-#### suffix. A bare id
// anywhere in the text is the fallback.
fn hypothesis_id(text: &str) -> Option<String> {
    let run_pattern = Regex::new(
        r"Run ID:\s*([0-9]{4}-[0-9]{2}-[0-9]{2}[-_][0-9]{2}[-:]?[0-9]{2}[-:]?[0-9]{2}(?:-[A-Z]+-[0-9]{4,})?)",
    )
    .expect("regex");
    if let Some(cap) = run_pattern.captures(text) {
        let run_id = &cap[1];
        let suffix = run_id
            .find("-HYP-")
            .or_else(|| run_id.find("_HYP-"))
            .map(|idx| run_id[idx + 1..].to_string());
        if suffix.is_some() {
            return suffix;
        }
    }

    let bare_pattern = Regex::new(r"HYP-[0-9]{4,}").expect("regex");
    bare_pattern.find(text).map(|m| m.as_str().to_string())
}
