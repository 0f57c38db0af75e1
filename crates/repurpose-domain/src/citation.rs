//! Literature and trial citations backing an evidence item or candidate.

use serde::{Deserialize, Serialize};

/// A single cited source, identified by (source_kind, source_id) — e.g.
/// ("pubmed", "30000001"). Two citations with the same identity are the same
/// citation regardless of how their other fields were populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub source_kind: String,
    pub source_id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub relevance: f64,
}

impl Citation {
    pub fn identity(&self) -> (&str, &str) {
        (self.source_kind.as_str(), self.source_id.as_str())
    }

    /// Truncate `text` to at most `max_chars`, breaking on the last space
    /// inside the limit rather than mid-word, and appending "..." when
    /// truncated. Mirrors the excerpt/description truncation used when
    /// building citations and evidence summaries from raw abstract text.
    pub fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let truncated: String = text.chars().take(max_chars).collect();
        let cut = truncated.rfind(' ').unwrap_or(truncated.len());
        format!("{}...", &truncated[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_text_is_unchanged() {
        assert_eq!(Citation::truncate("short text", 300), "short text");
    }

    #[test]
    fn truncate_breaks_on_last_space() {
        let text = "metformin activates AMPK which modulates breast cancer growth pathways";
        let truncated = Citation::truncate(text, 30);
        assert!(truncated.ends_with("..."));
        assert!(!truncated.trim_end_matches("...").ends_with(' '));
    }
}
