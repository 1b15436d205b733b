use std::collections::BTreeSet;
use std::path::{Component, Path};

use regex::Regex;

/// Canonicalize one free-text reference into a repo-relative POSIX path,
/// keeping any `#fragment` suffix verbatim. Returns `None` for anything
/// that is not evidence: URLs, paths outside the repo root, empty input.
pub fn normalize_evidence(raw: &str, repo_root: &Path) -> Option<String> {
    let entry = raw.trim();
    if entry.is_empty() {
        return None;
    }
    let scheme = Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://").expect("regex");
    if scheme.is_match(entry) {
        return None;
    }

    let (base, anchor) = split_anchor(entry);
    let path = Path::new(base);
    let normalized = if path.is_absolute() {
        match path.strip_prefix(repo_root) {
            Ok(rel) => to_posix(rel),
            Err(_) => return None,
        }
    } else {
        to_posix(path)
    };

    if normalized.is_empty() {
        return None;
    }
    Some(format!("{normalized}{anchor}"))
}

pub fn split_anchor(value: &str) -> (&str, &str) {
    match value.find('#') {
        Some(idx) => (&value[..idx], &value[idx..]),
        None => (value, ""),
    }
}

/// Scan free-form text for repository references: Markdown link targets and
/// bare tokens under a known top-level directory. Heuristic by design; a
/// missed reference is acceptable, a fabricated one is not, which is why the
/// bare-token pattern is anchored to known prefixes.
pub fn extract_repo_paths(text: &str, repo_root: &Path) -> Vec<String> {
    let mut found = BTreeSet::new();

    let link = Regex::new(r"\[[^\]]*\]\(([^)]+)\)").expect("regex");
    for cap in link.captures_iter(text) {
        if let Some(normalized) = normalize_evidence(&cap[1], repo_root) {
            found.insert(normalized);
        }
    }

    let inline = Regex::new(r"\b((?:docs|artifacts|tests|tools|src)/[^\s)]+)").expect("regex");
    for cap in inline.captures_iter(text) {
        if let Some(normalized) = normalize_evidence(&cap[1], repo_root) {
            found.insert(normalized);
        }
    }

    found.into_iter().collect()
}

// Lexical normalization only: drops `.` segments, keeps `..` as given.
fn to_posix(path: &Path) -> String {
    let mut segments: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().to_string()),
            Component::ParentDir => segments.push("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/repo/root")
    }

    #[test]
    fn rejects_urls_and_empty_input() {
        assert_eq!(normalize_evidence("https://example.com/x", &root()), None);
        assert_eq!(normalize_evidence("s3://bucket/key", &root()), None);
        assert_eq!(normalize_evidence("", &root()), None);
        assert_eq!(normalize_evidence("   ", &root()), None);
    }

    #[test]
    fn rewrites_absolute_paths_under_the_root() {
        assert_eq!(
            normalize_evidence("/repo/root/docs/x.md", &root()),
            Some("docs/x.md".to_string())
        );
        assert_eq!(normalize_evidence("/abs/outside/repo/x", &root()), None);
    }

    #[test]
    fn keeps_anchor_fragments_verbatim() {
        assert_eq!(
            normalize_evidence("docs/x.md#section-2", &root()),
            Some("docs/x.md#section-2".to_string())
        );
        assert_eq!(
            normalize_evidence("/repo/root/docs/x.md#top", &root()),
            Some("docs/x.md#top".to_string())
        );
    }

    #[test]
    fn normalizes_relative_paths_lexically() {
        assert_eq!(
            normalize_evidence("./docs/./x.md", &root()),
            Some("docs/x.md".to_string())
        );
        assert_eq!(
            normalize_evidence("docs/../x.md", &root()),
            Some("docs/../x.md".to_string())
        );
    }

    #[test]
    fn extracts_links_and_known_prefix_tokens() {
        let text = "See [the plan](docs/plan.md#goals) and artifacts/logs/out.txt\n\
                    Ignore [external](https://example.com) and random/path.txt";
        let found = extract_repo_paths(text, &root());
        assert_eq!(
            found,
            vec![
                "artifacts/logs/out.txt".to_string(),
                "docs/plan.md#goals".to_string(),
            ]
        );
    }

    #[test]
    fn extraction_deduplicates_and_sorts() {
        let text = "tools/run.sh then tools/run.sh then [x](docs/a.md)";
        let found = extract_repo_paths(text, &root());
        assert_eq!(found, vec!["docs/a.md".to_string(), "tools/run.sh".to_string()]);
    }
}
