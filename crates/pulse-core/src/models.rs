use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::DateOutcome;

// ── RawRecord ─────────────────────────────────────────────────────────────────

/// A single scraped article record as read from a JSONL batch line.
///
/// Every column except `title`/`content`/`source` is optional in the input;
/// absent columns deserialize to their defaults and incomplete records are
/// dropped later by the merger, never at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Article URL; may be empty, in which case the merger assigns a
    /// synthetic unique key.
    #[serde(default)]
    pub url: String,
    /// Article headline.
    #[serde(default)]
    pub title: String,
    /// Article body (or RSS summary when no body was scraped).
    #[serde(default)]
    pub content: String,
    /// News outlet name as reported by the scraper.
    #[serde(default)]
    pub source: String,
    /// Raw publish-date string in whatever format the site emitted.
    #[serde(default)]
    pub publish_date: Option<String>,
    /// Raw scrape timestamp written by the scraper.
    #[serde(default)]
    pub scraped_at: Option<String>,
    /// Serialized keyword-annotation list from upstream keyword extraction.
    #[serde(default)]
    pub matched_keywords: Option<String>,
    /// Per-article mean lexicon score, already computed upstream.
    #[serde(default)]
    pub avg_sentiment: f64,
    /// Number of scored words; a record with zero scored words carries no
    /// meaningful sentiment and is excluded from aggregation.
    #[serde(default)]
    pub word_count: u64,
}

// ── NormalizedRecord ──────────────────────────────────────────────────────────

/// A merged record with canonical date and scrape-time fields attached.
///
/// Derived from scratch on every pipeline run; never mutated incrementally.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    /// Canonical source name (after alias-table normalization).
    pub source: String,
    /// Canonical publish date, or the typed `Unparseable` sentinel.
    pub publish_date: DateOutcome,
    /// Scrape time in UTC, when the raw string was parseable.
    pub scrape_time: Option<DateTime<Utc>>,
    /// Raw keyword annotation, retained for entity attribution.
    pub matched_keywords: Option<String>,
    pub avg_sentiment: f64,
    pub word_count: u64,
}

// ── Entities ──────────────────────────────────────────────────────────────────

/// The closed set of entity categories an article can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A political candidate.
    Candidate,
    /// A topical theme (housing, transportation, ...).
    Theme,
}

/// One attribution of a record to an entity label.
///
/// A record may produce zero, one, or many matches — multi-label is
/// intentional since an article can concern several candidates or themes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMatch {
    /// The (unique, post-merge) URL of the contributing record.
    pub record_url: String,
    pub entity_kind: EntityKind,
    pub entity_label: String,
}

// ── TimeBucket ────────────────────────────────────────────────────────────────

/// An opaque ordered aggregation key.
///
/// Exactly one bucket kind is active per aggregation run; buckets of
/// different kinds are never mixed in one output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBucket {
    /// One calendar day.
    Day(NaiveDate),
    /// One calendar week, keyed by its Monday.
    Week(NaiveDate),
    /// One hour of scrape time (truncated to the hour, UTC).
    Hour(DateTime<Utc>),
    /// Stable per-source insertion index; comparable only within a source.
    Seq(u64),
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeBucket::Day(d) | TimeBucket::Week(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TimeBucket::Hour(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:00")),
            TimeBucket::Seq(i) => write!(f, "{}", i),
        }
    }
}

impl Serialize for TimeBucket {
    /// Serializes to an ISO calendar date, an ISO date+hour, or a plain
    /// non-negative integer, depending on the active granularity policy.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimeBucket::Seq(i) => serializer.serialize_u64(*i),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

// ── GranularityPolicy ─────────────────────────────────────────────────────────

/// The time-bucket kind selected for one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GranularityPolicy {
    /// Bucket by publish date. `weekly` switches the sub-bucket to week
    /// starts for readability when the date range is wide.
    Daily { weekly: bool },
    /// Bucket by scrape time truncated to the hour.
    Hourly,
    /// Bucket by stable per-source insertion order.
    Sequential,
}

impl GranularityPolicy {
    /// Short lowercase tag used in logs and exported metadata.
    pub fn label(&self) -> &'static str {
        match self {
            GranularityPolicy::Daily { weekly: false } => "daily",
            GranularityPolicy::Daily { weekly: true } => "weekly",
            GranularityPolicy::Hourly => "hourly",
            GranularityPolicy::Sequential => "sequential",
        }
    }
}

// ── AggregateRow ──────────────────────────────────────────────────────────────

/// One row of the terminal aggregate table.
///
/// `entity_label = None` means "all articles from this source" — the
/// source-level aggregate. A `(bucket, source)` pair with zero qualifying
/// records is never emitted; zero sentiment is a valid value and must not
/// be confused with "no data".
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRow {
    pub bucket: TimeBucket,
    pub source: String,
    pub entity_label: Option<String>,
    pub article_count: u32,
    pub mean_sentiment: f64,
    pub median_sentiment: f64,
    /// Centered rolling mean over the bucketed series; `None` at series
    /// boundaries where the full window is unavailable.
    pub smoothed_sentiment: Option<f64>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
