//! Entity attribution from noisy keyword annotations and article text.
//!
//! Upstream keyword extraction is itself unreliable, so attribution runs in
//! two independent modes: membership of a configured term in the parsed
//! keyword-token set, and substring presence in the lower-cased title and
//! body. A hit in either mode attributes the record to the label.

use std::collections::BTreeSet;

use crate::config::{LookupEntry, PipelineConfig};
use crate::models::{EntityKind, EntityMatch, NormalizedRecord};

// ── Keyword-annotation parsing ────────────────────────────────────────────────

/// Parse a serialized keyword-annotation string into lower-cased tokens.
///
/// The scraper writes a Python-list-ish representation such as
/// `"['mayor', 'city council (title)']"`. Parsing strips the list
/// delimiters, per-token quotes, and trailing title-match markers, splits
/// on commas, and drops empty tokens. A null/empty annotation yields an
/// empty set, which is not grounds for exclusion — free-text attribution
/// still applies.
pub fn parse_keyword_tokens(raw: Option<&str>) -> BTreeSet<String> {
    let Some(raw) = raw else {
        return BTreeSet::new();
    };

    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|token| {
            let token = token.trim().trim_matches(|c| c == '\'' || c == '"').trim();
            strip_title_marker(token).to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Remove a trailing `(title)` marker left by title-match bookkeeping.
fn strip_title_marker(token: &str) -> &str {
    // The marker is ASCII, so the byte-length slice is safe.
    if token.to_lowercase().ends_with("(title)") {
        token[..token.len() - "(title)".len()].trim_end()
    } else {
        token
    }
}

// ── EntityAttributor ──────────────────────────────────────────────────────────

/// Maps records onto candidate and theme labels via the configured tables.
pub struct EntityAttributor {
    candidates: Vec<LookupEntry>,
    themes: Vec<LookupEntry>,
}

impl EntityAttributor {
    /// Create an attributor with explicit lookup tables.
    pub fn new(candidates: Vec<LookupEntry>, themes: Vec<LookupEntry>) -> Self {
        Self { candidates, themes }
    }

    /// Create an attributor from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.candidates.clone(), config.themes.clone())
    }

    /// Attribute one record to all matching entity labels.
    ///
    /// All matches are retained — an article about two candidates yields
    /// two matches. The result is sorted by label name so downstream
    /// presentation is deterministic.
    pub fn attribute(&self, record: &NormalizedRecord) -> Vec<EntityMatch> {
        let tokens = parse_keyword_tokens(record.matched_keywords.as_deref());
        let full_text = format!("{} {}", record.title, record.content).to_lowercase();

        let mut matches: Vec<EntityMatch> = Vec::new();
        let tables = [
            (EntityKind::Candidate, &self.candidates),
            (EntityKind::Theme, &self.themes),
        ];
        for (kind, table) in tables {
            for entry in table {
                if Self::entry_matches(entry, &tokens, &full_text) {
                    matches.push(EntityMatch {
                        record_url: record.url.clone(),
                        entity_kind: kind,
                        entity_label: entry.label.clone(),
                    });
                }
            }
        }

        matches.sort_by(|a, b| a.entity_label.cmp(&b.entity_label));
        matches
    }

    /// True when any of the entry's terms matches a keyword token exactly or
    /// appears as a substring of the article text.
    fn entry_matches(entry: &LookupEntry, tokens: &BTreeSet<String>, full_text: &str) -> bool {
        entry.terms.iter().any(|term| {
            let term = term.to_lowercase();
            tokens.contains(&term) || full_text.contains(&term)
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateOutcome;

    fn record(title: &str, content: &str, keywords: Option<&str>) -> NormalizedRecord {
        NormalizedRecord {
            url: "https://example.com/a".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            source: "Seattle Times".to_string(),
            publish_date: DateOutcome::Unparseable,
            scrape_time: None,
            matched_keywords: keywords.map(|k| k.to_string()),
            avg_sentiment: 0.1,
            word_count: 100,
        }
    }

    fn attributor() -> EntityAttributor {
        EntityAttributor::new(
            vec![
                LookupEntry::new("harrell", &["harrell", "bruce harrell"]),
                LookupEntry::new("wilson", &["wilson", "katie wilson"]),
            ],
            vec![
                LookupEntry::new("housing", &["housing", "zoning"]),
                LookupEntry::new("transit", &["transit", "transportation"]),
            ],
        )
    }

    // ── parse_keyword_tokens ──────────────────────────────────────────────────

    #[test]
    fn test_parse_tokens_python_list_repr() {
        let tokens = parse_keyword_tokens(Some("['mayor', 'city council', 'budget']"));
        assert!(tokens.contains("mayor"));
        assert!(tokens.contains("city council"));
        assert!(tokens.contains("budget"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_parse_tokens_double_quotes_and_spacing() {
        let tokens = parse_keyword_tokens(Some(r#"[ "housing" ,  "transit" ]"#));
        assert!(tokens.contains("housing"));
        assert!(tokens.contains("transit"));
    }

    #[test]
    fn test_parse_tokens_strips_title_marker() {
        let tokens = parse_keyword_tokens(Some("['mayor (title)', 'budget']"));
        assert!(tokens.contains("mayor"));
        assert!(!tokens.iter().any(|t| t.contains("(title)")));
    }

    #[test]
    fn test_parse_tokens_lowercases() {
        let tokens = parse_keyword_tokens(Some("['Mayor', 'BUDGET']"));
        assert!(tokens.contains("mayor"));
        assert!(tokens.contains("budget"));
    }

    #[test]
    fn test_parse_tokens_empty_inputs() {
        assert!(parse_keyword_tokens(None).is_empty());
        assert!(parse_keyword_tokens(Some("")).is_empty());
        assert!(parse_keyword_tokens(Some("[]")).is_empty());
        assert!(parse_keyword_tokens(Some("[,,]")).is_empty());
    }

    // ── attribute ─────────────────────────────────────────────────────────────

    #[test]
    fn test_attribute_via_keyword_token() {
        let rec = record("Council roundup", "Short summary.", Some("['housing']"));
        let matches = attributor().attribute(&rec);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entity_label, "housing");
        assert_eq!(matches[0].entity_kind, EntityKind::Theme);
    }

    #[test]
    fn test_attribute_via_full_text_without_keywords() {
        // Null keyword annotation with a matching body still attributes.
        let rec = record(
            "Interview",
            "Bruce Harrell spoke about transit expansion.",
            None,
        );
        let matches = attributor().attribute(&rec);
        let labels: Vec<&str> = matches.iter().map(|m| m.entity_label.as_str()).collect();
        assert_eq!(labels, vec!["harrell", "transit"]);
    }

    #[test]
    fn test_attribute_multi_label_retained() {
        let rec = record(
            "Debate recap",
            "Harrell and Wilson clashed over housing policy.",
            Some("['housing']"),
        );
        let matches = attributor().attribute(&rec);
        let labels: Vec<&str> = matches.iter().map(|m| m.entity_label.as_str()).collect();
        // All matches kept, sorted by label.
        assert_eq!(labels, vec!["harrell", "housing", "wilson"]);
    }

    #[test]
    fn test_attribute_no_match_is_empty_not_error() {
        let rec = record("Weather", "Sunny with light rain later.", Some("['weather']"));
        assert!(attributor().attribute(&rec).is_empty());
    }

    #[test]
    fn test_attribute_monotonic_in_token_coverage() {
        let base = record("Council roundup", "Short summary.", Some("['housing']"));
        let widened = record(
            "Council roundup",
            "Short summary.",
            Some("['housing', 'transit']"),
        );
        let base_labels: BTreeSet<String> = attributor()
            .attribute(&base)
            .into_iter()
            .map(|m| m.entity_label)
            .collect();
        let widened_labels: BTreeSet<String> = attributor()
            .attribute(&widened)
            .into_iter()
            .map(|m| m.entity_label)
            .collect();
        assert!(base_labels.is_subset(&widened_labels));
    }

    #[test]
    fn test_attribute_candidate_kind() {
        let rec = record("Profile", "Katie Wilson's campaign.", None);
        let matches = attributor().attribute(&rec);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entity_kind, EntityKind::Candidate);
        assert_eq!(matches[0].record_url, "https://example.com/a");
    }
}
