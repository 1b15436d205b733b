use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::index::HistoryRow;

pub const TIMELINE_HEADER: &str = "# Deep Thoughts Timeline\n";

pub const TIMELINE_PREAMBLE: &str = "> A narrative reconstruction derived from run \
artifacts, intended to illustrate a deterministic decision process rather than \
serve as a primary source of truth.\n";

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("Failed to build CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to finish CSV export: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One journal file feeding the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSource {
    pub run_id: String,
    pub rel_path: String,
    pub body: String,
}

/// Reverse-chronological digest of journal entries: heading, a link to the
/// full entry, and its summary line (or first line of prose).
pub fn render_timeline(sources: &[TimelineSource]) -> String {
    let mut ordered: Vec<&TimelineSource> = sources.iter().collect();
    ordered.sort_by(|a, b| b.run_id.cmp(&a.run_id));

    let mut content = vec![TIMELINE_HEADER.to_string(), TIMELINE_PREAMBLE.to_string()];
    for source in ordered {
        let lines: Vec<&str> = source.body.lines().collect();
        let title = lines
            .first()
            .map(|line| line.trim_start_matches(|c| c == '#' || c == ' ').trim())
            .filter(|line| !line.is_empty())
            .unwrap_or(&source.run_id);
        let label = stem_date(&source.run_id)
            .map(|date| date.to_string())
            .unwrap_or_else(|| source.run_id.clone());

        content.push(format!("## {label} - {title}"));
        content.push(format!("\n[View Journal]({})\n", source.rel_path));
        content.push(format!("{}\n", summary_line(&lines)));
        content.push("---\n".to_string());
    }
    content.join("\n")
}

/// Flat CSV export of history rows, one line per record.
pub fn render_timeline_csv(rows: &[HistoryRow]) -> Result<String, TimelineError> {
    #[derive(Serialize)]
    struct CsvRow<'a> {
        timestamp: &'a str,
        record_type: &'a str,
        id: &'a str,
        status: &'a str,
        summary: &'a str,
        evidence: String,
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(CsvRow {
            timestamp: &row.timestamp,
            record_type: &row.record_type,
            id: &row.id,
            status: &row.status,
            summary: &row.summary,
            evidence: row.evidence.join(" "),
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| TimelineError::Io(err.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn summary_line(lines: &[&str]) -> String {
    for line in lines {
        if line.to_lowercase().starts_with("summary:") {
            return line.to_string();
        }
    }
    lines
        .iter()
        .skip(1)
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}

// A date embedded anywhere in the stem, most often as its prefix.
fn stem_date(stem: &str) -> Option<NaiveDate> {
    let bytes = stem.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    for start in 0..=bytes.len() - 10 {
        if !stem.is_char_boundary(start) || !stem.is_char_boundary(start + 10) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(&stem[start..start + 10], "%Y-%m-%d") {
            return Some(date);
        }
    }
    None
}
