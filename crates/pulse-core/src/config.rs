//! Pipeline configuration: entity lookup tables, source alias table, and
//! the numeric thresholds consumed by the date normalizer, granularity
//! selector, and aggregator.
//!
//! Configuration is an explicit object passed into the components at
//! construction — there is no process-wide shared state.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PipelineError, Result};

// ── Lookup tables ─────────────────────────────────────────────────────────────

/// One entity label and the pattern terms that attribute a record to it.
///
/// Table order is preserved from the configuration file; output rows are
/// nevertheless sorted by label for deterministic presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupEntry {
    pub label: String,
    pub terms: Vec<String>,
}

impl LookupEntry {
    pub fn new(label: &str, terms: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// One canonical outlet name and the scraped variants that collapse to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAlias {
    pub canonical: String,
    pub variants: Vec<String>,
}

// ── PipelineConfig ────────────────────────────────────────────────────────────

/// All tunables for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Candidate lookup table; deployment-specific, empty by default.
    pub candidates: Vec<LookupEntry>,
    /// Theme lookup table; defaults to the built-in civic-topics table.
    pub themes: Vec<LookupEntry>,
    /// Source-name equivalence table; unmatched sources pass through.
    pub source_aliases: Vec<SourceAlias>,
    /// Publish dates before this year are treated as misparsed garbage.
    pub min_year: i32,
    /// Opt-in assumed year for year-less `Month DD at ...` publish dates.
    pub default_year: Option<i32>,
    /// Minimum distinct valid publish dates required for daily bucketing.
    pub min_distinct_dates: usize,
    /// Date range (days) beyond which daily buckets become weekly.
    pub weekly_range_days: i64,
    /// Rolling-average window, in buckets.
    pub smoothing_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            themes: default_themes(),
            source_aliases: Vec::new(),
            min_year: 2000,
            default_year: None,
            min_distinct_dates: 3,
            weekly_range_days: 90,
            smoothing_window: 3,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Absent fields fall back to their defaults, so a partial file that
    /// only overrides the lookup tables is valid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation; violations are fatal, caller-surfaced errors.
    pub fn validate(&self) -> Result<()> {
        if self.smoothing_window == 0 {
            return Err(PipelineError::Config(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        if self.min_distinct_dates == 0 {
            return Err(PipelineError::Config(
                "min_distinct_dates must be at least 1".to_string(),
            ));
        }
        for entry in self.candidates.iter().chain(self.themes.iter()) {
            if entry.label.trim().is_empty() {
                return Err(PipelineError::Config(
                    "lookup entry with empty label".to_string(),
                ));
            }
            if entry.terms.is_empty() {
                return Err(PipelineError::Config(format!(
                    "lookup entry \"{}\" has no pattern terms",
                    entry.label
                )));
            }
        }
        Ok(())
    }

    /// Map a scraped source name onto its canonical outlet name.
    ///
    /// Matching is case-insensitive over both canonical names and their
    /// variants; unmatched sources pass through trimmed but unchanged.
    pub fn canonical_source(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        for alias in &self.source_aliases {
            if alias.canonical.eq_ignore_ascii_case(trimmed)
                || alias
                    .variants
                    .iter()
                    .any(|v| v.eq_ignore_ascii_case(trimmed))
            {
                return alias.canonical.clone();
            }
        }
        trimmed.to_string()
    }

    /// Whether any entity lookup table is configured.
    pub fn has_entity_tables(&self) -> bool {
        !self.candidates.is_empty() || !self.themes.is_empty()
    }
}

/// The built-in theme table, seeded from the scraper's relevance keywords.
fn default_themes() -> Vec<LookupEntry> {
    vec![
        LookupEntry::new("budget", &["budget", "taxes"]),
        LookupEntry::new(
            "elections",
            &["election", "candidate", "referendum"],
        ),
        LookupEntry::new(
            "governance",
            &["mayor", "city council", "governance", "policy", "municipal"],
        ),
        LookupEntry::new(
            "housing",
            &["housing", "homeless", "zoning", "development"],
        ),
        LookupEntry::new("parks", &["parks"]),
        LookupEntry::new(
            "public-safety",
            &["public safety", "police", "fire department"],
        ),
        LookupEntry::new(
            "transportation",
            &["transportation", "transit", "infrastructure"],
        ),
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
