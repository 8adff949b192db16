//! Granularity selection for one aggregation run.
//!
//! Scraped publish dates frequently collapse to a single day (a scrape-time
//! artifact), which would turn the "timeline" into a single point. The
//! selector inspects the normalized date distribution and picks the finest
//! usable axis, falling back from calendar dates to scrape hours to plain
//! per-source sequence order.

use std::collections::BTreeSet;

use chrono::{DateTime, DurationRound, NaiveDate, TimeDelta, Utc};
use pulse_core::models::{GranularityPolicy, NormalizedRecord};
use tracing::info;

// ── GranularitySelector ───────────────────────────────────────────────────────

/// Chooses the time-bucket kind for a dataset.
pub struct GranularitySelector {
    min_distinct_dates: usize,
    weekly_range_days: i64,
}

impl GranularitySelector {
    pub fn new(min_distinct_dates: usize, weekly_range_days: i64) -> Self {
        Self {
            min_distinct_dates,
            weekly_range_days,
        }
    }

    /// Evaluate the policy state machine top-down; first satisfied state wins.
    ///
    /// * **Daily** — at least `min_distinct_dates` distinct valid publish
    ///   dates; flips to weekly sub-buckets when the range exceeds
    ///   `weekly_range_days` (a readability switch, not a separate state).
    /// * **Hourly** — otherwise, when scrape timestamps span ≥ 2 distinct
    ///   hours.
    /// * **Sequential** — the unconditional fallback.
    ///
    /// The decision is informational, not a failure; it is logged and
    /// reported in the run metadata.
    pub fn select(&self, records: &[NormalizedRecord]) -> GranularityPolicy {
        let dates: BTreeSet<NaiveDate> = records
            .iter()
            .filter_map(|r| r.publish_date.as_date())
            .collect();

        if dates.len() >= self.min_distinct_dates {
            let weekly = match (dates.first(), dates.last()) {
                (Some(first), Some(last)) => {
                    (*last - *first).num_days() > self.weekly_range_days
                }
                _ => false,
            };
            let policy = GranularityPolicy::Daily { weekly };
            info!(
                "GranularitySelector: {} distinct dates, selecting {}",
                dates.len(),
                policy.label()
            );
            return policy;
        }

        let hours: BTreeSet<DateTime<Utc>> = records
            .iter()
            .filter_map(|r| r.scrape_time)
            .map(truncate_to_hour)
            .collect();

        if hours.len() >= 2 {
            info!(
                "GranularitySelector: only {} distinct dates but {} scrape hours, selecting hourly",
                dates.len(),
                hours.len()
            );
            return GranularityPolicy::Hourly;
        }

        info!(
            "GranularitySelector: degenerate date distribution ({} dates, {} hours), selecting sequential",
            dates.len(),
            hours.len()
        );
        GranularityPolicy::Sequential
    }
}

/// Round a UTC timestamp down to the start of its hour.
pub fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(TimeDelta::hours(1)).unwrap_or(ts)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
