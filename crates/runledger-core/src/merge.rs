use std::collections::{BTreeMap, BTreeSet};

use crate::record::{
    is_unknown_run, normalize_status, AgendaRecord, HistoryRecord, HypothesisRecord, RecordKind,
    DEFAULT_STATUS, UNKNOWN_RUN,
};

/// Earlier of two run identities; the unknown sentinel always defers.
pub fn pick_first_seen(existing: &str, incoming: &str) -> String {
    if is_unknown_run(existing) {
        return canonical_run(incoming);
    }
    if is_unknown_run(incoming) {
        return existing.to_string();
    }
    existing.min(incoming).to_string()
}

pub fn pick_last_seen(existing: &str, incoming: &str) -> String {
    if is_unknown_run(existing) {
        return canonical_run(incoming);
    }
    if is_unknown_run(incoming) {
        return existing.to_string();
    }
    existing.max(incoming).to_string()
}

fn canonical_run(value: &str) -> String {
    if is_unknown_run(value) {
        UNKNOWN_RUN.to_string()
    } else {
        value.to_string()
    }
}

pub fn merge_evidence(existing: &[String], incoming: &[String]) -> Vec<String> {
    let merged: BTreeSet<String> = existing
        .iter()
        .chain(incoming.iter())
        .filter(|entry| !entry.is_empty())
        .cloned()
        .collect();
    merged.into_iter().collect()
}

// An unstated status normalizes to the default, and the default never
// overwrites a previously asserted status: silence is not evidence of
// reverting.
fn merge_status(existing: &str, incoming: &str) -> String {
    let existing = normalize_status(existing);
    let incoming = normalize_status(incoming);
    if incoming == DEFAULT_STATUS && existing != DEFAULT_STATUS {
        existing
    } else {
        incoming
    }
}

fn merge_text(existing: &mut String, incoming: &str) {
    let incoming = incoming.trim();
    if !incoming.is_empty() && (existing.is_empty() || incoming.len() > existing.len()) {
        *existing = incoming.to_string();
    }
}

pub fn merge_hypothesis(
    existing: Option<HypothesisRecord>,
    incoming: HypothesisRecord,
) -> HypothesisRecord {
    let Some(mut merged) = existing else {
        return incoming;
    };

    merge_text(&mut merged.claim, &incoming.claim);
    merged.status = merge_status(&merged.status, &incoming.status);
    merged.first_seen_run = pick_first_seen(&merged.first_seen_run, &incoming.first_seen_run);
    merged.last_seen_run = pick_last_seen(&merged.last_seen_run, &incoming.last_seen_run);
    merged.timestamp = merged.last_seen_run.clone();
    merged.evidence = merge_evidence(&merged.evidence, &incoming.evidence);
    for (key, value) in incoming.extra {
        merged.extra.entry(key).or_insert(value);
    }
    merged
}

pub fn merge_agenda(existing: Option<AgendaRecord>, incoming: AgendaRecord) -> AgendaRecord {
    let Some(mut merged) = existing else {
        return incoming;
    };

    merge_text(&mut merged.summary, &incoming.summary);
    merged.status = merge_status(&merged.status, &incoming.status);
    merged.first_seen_run = pick_first_seen(&merged.first_seen_run, &incoming.first_seen_run);
    merged.last_seen_run = pick_last_seen(&merged.last_seen_run, &incoming.last_seen_run);
    merged.timestamp = merged.last_seen_run.clone();
    merged.evidence = merge_evidence(&merged.evidence, &incoming.evidence);
    for (key, value) in incoming.extra {
        merged.extra.entry(key).or_insert(value);
    }
    merged
}

/// Fold one record into the `(kind, key)` map. Hypothesis and agenda
/// records merge field by field; a journal record replaces any prior one
/// with the same timestamp key wholesale.
pub fn fold_record(map: &mut BTreeMap<(RecordKind, String), HistoryRecord>, record: HistoryRecord) {
    let key = record.key();
    match record {
        HistoryRecord::Hypothesis(incoming) => {
            let existing = match map.remove(&key) {
                Some(HistoryRecord::Hypothesis(existing)) => Some(existing),
                _ => None,
            };
            map.insert(
                key,
                HistoryRecord::Hypothesis(merge_hypothesis(existing, incoming)),
            );
        }
        HistoryRecord::Agenda(incoming) => {
            let existing = match map.remove(&key) {
                Some(HistoryRecord::Agenda(existing)) => Some(existing),
                _ => None,
            };
            map.insert(key, HistoryRecord::Agenda(merge_agenda(existing, incoming)));
        }
        HistoryRecord::Journal(incoming) => {
            map.insert(key, HistoryRecord::Journal(incoming));
        }
    }
}
