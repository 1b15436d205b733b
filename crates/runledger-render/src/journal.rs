pub const JOURNAL_HEADER: &str = "### Deep Thoughts, by an Agent";

pub const JOURNAL_DISCLAIMER: &str = "*Editor's note: This entry is a dramatized \
reconstruction of a deterministic decision process, derived from run artifacts.*";

/// Everything the journal template needs about one run.
#[derive(Debug, Clone)]
pub struct JournalContext {
    pub run_id: String,
    pub plan_summary: String,
    pub outcome: String,
    pub lessons: Vec<String>,
}

/// Deterministic, post-hoc, and theatrical: the same artifacts always
/// produce the same entry.
pub fn render_journal_entry(context: &JournalContext) -> String {
    let mut body = vec![
        format!("**Run {}**", context.run_id),
        String::new(),
        format!("**Goal**: {}", context.plan_summary),
        format!("**Outcome**: {}", context.outcome),
        String::new(),
        "**Reflections**:".to_string(),
    ];
    if context.lessons.is_empty() {
        body.push("- I learned nothing specific this time.".to_string());
    } else {
        for lesson in &context.lessons {
            body.push(format!("- {lesson}"));
        }
    }
    body.push(String::new());
    body.push("**Decision**: I proceeded with the available evidence.".to_string());

    format!(
        "{JOURNAL_HEADER}\n*(reconstructed)*\n\n{}\n\n---\n\n{JOURNAL_DISCLAIMER}\n",
        body.join("\n")
    )
}
