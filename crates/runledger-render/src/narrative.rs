pub const NARRATIVE_HEADER: &str =
    "# Deep Thoughts: A Journal Timeline\n\n*(Reverse chronological order)*\n";

/// One journal entry as the narrative sees it: the run id and the raw
/// markdown body, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeEntry {
    pub run_id: String,
    pub body: String,
}

/// Stitch journal entries into the single reverse-chronological narrative
/// document. Returns the empty string when there are no entries.
pub fn render_narrative(entries: &[NarrativeEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut ordered: Vec<&NarrativeEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| b.run_id.cmp(&a.run_id));

    let mut buffer = vec![NARRATIVE_HEADER.to_string()];
    for entry in ordered {
        buffer.push(format!("\n## {}\n\n{}\n", entry.run_id, entry.body));
    }
    let joined = buffer.join("\n");
    format!("{}\n", joined.trim())
}
