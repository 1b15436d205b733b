use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel run identity meaning "no run attribution". Never compared as
/// earlier or later than a real run name.
pub const UNKNOWN_RUN: &str = "unknown";

pub const DEFAULT_STATUS: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecordKind {
    Agenda,
    Hypothesis,
    Journal,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Agenda => "agenda",
            RecordKind::Hypothesis => "hypothesis",
            RecordKind::Journal => "journal",
        }
    }
}

/// A tracked claim under test, keyed by its stable external id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisRecord {
    pub id: String,
    #[serde(default)]
    pub claim: String,
    #[serde(default)]
    pub status: String,
    #[serde(default = "unknown_run")]
    pub first_seen_run: String,
    #[serde(default = "unknown_run")]
    pub last_seen_run: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl HypothesisRecord {
    pub fn fragment(
        id: &str,
        claim: &str,
        status: Option<&str>,
        run_name: &str,
        evidence: Vec<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            claim: claim.to_string(),
            status: normalize_status(status.unwrap_or_default()),
            first_seen_run: run_name.to_string(),
            last_seen_run: run_name.to_string(),
            timestamp: run_name.to_string(),
            evidence,
            extra: BTreeMap::new(),
        }
    }
}

/// An externally declared open item, tracked independently of any run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaRecord {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: String,
    #[serde(default = "unknown_run")]
    pub first_seen_run: String,
    #[serde(default = "unknown_run")]
    pub last_seen_run: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A timestamp-keyed pointer to a narrative artifact. Never field-merged;
/// regeneration replaces the record with the same key wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub timestamp: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "lowercase")]
pub enum HistoryRecord {
    Agenda(AgendaRecord),
    Hypothesis(HypothesisRecord),
    Journal(JournalRecord),
}

impl HistoryRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            HistoryRecord::Agenda(_) => RecordKind::Agenda,
            HistoryRecord::Hypothesis(_) => RecordKind::Hypothesis,
            HistoryRecord::Journal(_) => RecordKind::Journal,
        }
    }

    /// Identity within the log: id for hypothesis and agenda records, the
    /// timestamp for journal records.
    pub fn key(&self) -> (RecordKind, String) {
        let key = match self {
            HistoryRecord::Agenda(record) => record.id.clone(),
            HistoryRecord::Hypothesis(record) => record.id.clone(),
            HistoryRecord::Journal(record) => record.timestamp.clone(),
        };
        (self.kind(), key)
    }

    pub fn sort_key(&self) -> (&str, &str, &'static str) {
        match self {
            HistoryRecord::Agenda(record) => (&record.timestamp, &record.id, "agenda"),
            HistoryRecord::Hypothesis(record) => (&record.timestamp, &record.id, "hypothesis"),
            HistoryRecord::Journal(record) => (&record.timestamp, "", "journal"),
        }
    }
}

pub fn unknown_run() -> String {
    UNKNOWN_RUN.to_string()
}

pub fn is_unknown_run(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == UNKNOWN_RUN
}

/// Lower-cased, trimmed status; empty and absent both collapse to the
/// default so "no status stated" and "active" are indistinguishable.
pub fn normalize_status(status: &str) -> String {
    let normalized = status.trim().to_lowercase();
    if normalized.is_empty() {
        DEFAULT_STATUS.to_string()
    } else {
        normalized
    }
}

/// One compact JSON object, keys sorted. serde_json's default map is
/// ordered, so round-tripping through `Value` yields a stable byte form.
pub fn to_line(record: &HistoryRecord) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(record)?;
    serde_json::to_string(&value)
}

pub fn from_line(line: &str) -> Result<HistoryRecord, serde_json::Error> {
    serde_json::from_str(line)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn normalize_status_defaults_and_lowercases() {
        assert_eq!(normalize_status(""), "active");
        assert_eq!(normalize_status("  "), "active");
        assert_eq!(normalize_status(" Blocked "), "blocked");
        assert_eq!(normalize_status("FINISHED"), "finished");
    }

    #[test]
    fn lines_are_compact_with_sorted_keys() {
        let record = HistoryRecord::Hypothesis(HypothesisRecord::fragment(
            "HYP-0001",
            "claim text",
            Some("proposed"),
            "run1",
            vec!["docs/a.md".to_string()],
        ));
        let line = to_line(&record).expect("serialize");
        assert_eq!(
            line,
            "{\"claim\":\"claim text\",\"evidence\":[\"docs/a.md\"],\
             \"first_seen_run\":\"run1\",\"id\":\"HYP-0001\",\
             \"last_seen_run\":\"run1\",\"record_type\":\"hypothesis\",\
             \"status\":\"proposed\",\"timestamp\":\"run1\"}"
        );
    }

    #[test]
    fn lines_round_trip_with_passthrough_fields() {
        let line = "{\"record_type\":\"hypothesis\",\"id\":\"HYP-0002\",\
                    \"status\":\"blocked\",\"owner\":\"team-a\"}";
        let record = from_line(line).expect("parse");
        let HistoryRecord::Hypothesis(hyp) = &record else {
            panic!("expected hypothesis");
        };
        assert_eq!(hyp.id, "HYP-0002");
        assert_eq!(hyp.first_seen_run, UNKNOWN_RUN);
        assert_eq!(
            hyp.extra.get("owner"),
            Some(&Value::String("team-a".to_string()))
        );

        let reserialized = to_line(&record).expect("serialize");
        assert!(reserialized.contains("\"owner\":\"team-a\""));
    }

    #[test]
    fn journal_records_key_on_timestamp() {
        let record = HistoryRecord::Journal(JournalRecord {
            timestamp: "2026-01-01-run".to_string(),
            summary: "Journal entry for 2026-01-01-run".to_string(),
            evidence: vec!["artifacts/journal/2026-01-01-run.md".to_string()],
            extra: BTreeMap::new(),
        });
        assert_eq!(
            record.key(),
            (RecordKind::Journal, "2026-01-01-run".to_string())
        );
    }
}
