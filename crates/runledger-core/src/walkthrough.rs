use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::evidence::extract_repo_paths;
use crate::record::HypothesisRecord;

pub const WALKTHROUGH_FILENAME: &str = "walkthrough.md";

/// Parse a run's narrative walkthrough into hypothesis fragments, one per
/// unique id mentioned. The walkthrough never asserts a status; evidence is
/// the whole-document extraction, shared across every fragment rather than
/// attributed line by line.
pub fn parse_walkthrough(run_dir: &Path, repo_root: &Path) -> Vec<HypothesisRecord> {
    let path = run_dir.join(WALKTHROUGH_FILENAME);
    let Ok(text) = fs::read_to_string(&path) else {
        return Vec::new();
    };

    let id_pattern = Regex::new(r"HYP-[0-9]{4,}").expect("regex");
    let ids: BTreeSet<String> = id_pattern
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();
    if ids.is_empty() {
        return Vec::new();
    }

    let claims = claim_pairs(&text);
    let fallback = fallback_claim(&text);
    let evidence = extract_repo_paths(&text, repo_root);
    let run_name = run_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    ids.into_iter()
        .map(|id| {
            let claim = claims
                .get(&id)
                .map(String::as_str)
                .or(fallback.as_deref())
                .unwrap_or("");
            HypothesisRecord::fragment(&id, claim, None, &run_name, evidence.clone())
        })
        .collect()
}

// Same-line "<id> ... : claim" / "- claim" / en-dash pairs; a later line
// for the same id wins.
fn claim_pairs(text: &str) -> BTreeMap<String, String> {
    let pattern = Regex::new(r"\b(HYP-[0-9]{4,})\b[^\n]*?[:\-–]\s*(.+)").expect("regex");
    let mut pairs = BTreeMap::new();
    for line in text.lines() {
        if let Some(cap) = pattern.captures(line) {
            pairs.insert(cap[1].to_string(), cap[2].trim().to_string());
        }
    }
    pairs
}

fn fallback_claim(text: &str) -> Option<String> {
    for line in text.lines() {
        if let Some((_, rest)) = line.split_once("Hypothesis:") {
            return Some(rest.trim().to_string());
        }
    }
    None
}

/// Bullets under a heading containing "lessons", for lessons promotion and
/// the journal generator.
pub fn extract_lessons(text: &str) -> Vec<String> {
    let mut lessons = Vec::new();
    let mut in_lessons = false;
    for line in text.lines() {
        if line.starts_with('#') && line.to_lowercase().contains("lessons") {
            in_lessons = true;
            continue;
        }
        if in_lessons && line.starts_with('#') {
            break;
        }
        if in_lessons {
            if let Some(item) = line.trim().strip_prefix("- ") {
                lessons.push(item.to_string());
            }
        }
    }
    lessons
}

pub fn lessons_for_run(run_dir: &Path) -> Vec<String> {
    let path = run_dir.join(WALKTHROUGH_FILENAME);
    match fs::read_to_string(&path) {
        Ok(text) => extract_lessons(&text),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write_walkthrough(run_dir: &Path, body: &str) {
        fs::create_dir_all(run_dir).expect("run dir");
        fs::write(run_dir.join(WALKTHROUGH_FILENAME), body).expect("write walkthrough");
    }

    #[test]
    fn missing_walkthrough_yields_nothing() {
        let temp = TempDir::new().expect("tempdir");
        let run_dir = temp.path().join("run1");
        fs::create_dir_all(&run_dir).expect("run dir");
        assert!(parse_walkthrough(&run_dir, temp.path()).is_empty());
    }

    #[test]
    fn inline_claims_beat_the_shared_fallback() {
        let temp = TempDir::new().expect("tempdir");
        let run_dir = temp.path().join("run1");
        write_walkthrough(
            &run_dir,
            "# Walkthrough\n\n\
             Hypothesis: shared observation\n\
             - HYP-0001 - cache misses dominate\n\
             Later we also touched HYP-0002.\n\
             Evidence: docs/notes.md\n",
        );

        let records = parse_walkthrough(&run_dir, temp.path());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "HYP-0001");
        assert_eq!(records[0].claim, "cache misses dominate");
        assert_eq!(records[1].id, "HYP-0002");
        assert_eq!(records[1].claim, "shared observation");
        for record in &records {
            assert_eq!(record.status, "active");
            assert_eq!(record.evidence, vec!["docs/notes.md"]);
            assert_eq!(record.first_seen_run, "run1");
        }
    }

    #[test]
    fn colon_and_en_dash_separators_are_accepted() {
        let temp = TempDir::new().expect("tempdir");
        let run_dir = temp.path().join("run1");
        write_walkthrough(
            &run_dir,
            "HYP-0003: colon claim\nHYP-0004 – en-dash claim\n",
        );

        let records = parse_walkthrough(&run_dir, temp.path());
        assert_eq!(records[0].claim, "colon claim");
        assert_eq!(records[1].claim, "en-dash claim");
    }

    #[test]
    fn ids_without_any_claim_text_stay_empty() {
        let temp = TempDir::new().expect("tempdir");
        let run_dir = temp.path().join("run1");
        write_walkthrough(&run_dir, "We looked at HYP-0009 today\n");

        let records = parse_walkthrough(&run_dir, temp.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].claim, "");
    }

    #[test]
    fn lessons_are_bullets_under_the_lessons_heading() {
        let text = "# Walkthrough\n\
                    - not a lesson\n\
                    ## Lessons Learned\n\
                    - check the cache first\n\
                    - always pin versions\n\
                    ## Next\n\
                    - not a lesson either\n";
        assert_eq!(
            extract_lessons(text),
            vec!["check the cache first", "always pin versions"]
        );
        assert!(extract_lessons("# Walkthrough\nNothing here\n").is_empty());
    }
}
