//! Grouped sentiment aggregation and rolling-mean smoothing.
//!
//! Records are assigned to time buckets under the selected granularity
//! policy, grouped by `(source, entity label, bucket)`, and reduced to
//! count / mean / median rows. A centered rolling mean is then computed
//! along each `(source, entity label)` series. Groups with zero qualifying
//! records are never emitted; absence of a row is the only "no data"
//! signal in the output.

use std::collections::{BTreeMap, HashMap};

use chrono::Weekday;
use pulse_core::models::{
    AggregateRow, EntityMatch, GranularityPolicy, NormalizedRecord, TimeBucket,
};
use tracing::debug;

use crate::granularity::truncate_to_hour;

// ── Statistics helpers ────────────────────────────────────────────────────────

/// Arithmetic mean; 0.0 for an empty slice (callers never pass one).
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median with even-length midpoint averaging.
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Reduces normalized records to the terminal aggregate table.
pub struct Aggregator {
    policy: GranularityPolicy,
    smoothing_window: usize,
}

impl Aggregator {
    pub fn new(policy: GranularityPolicy, smoothing_window: usize) -> Self {
        Self {
            policy,
            smoothing_window,
        }
    }

    /// Build the full aggregate table.
    ///
    /// Always emits source-level rows (`entity_label = None`); when
    /// `matches` is non-empty, per-entity rows are emitted alongside them.
    /// Rows are sorted by `(source, entity_label, bucket)`.
    pub fn aggregate(
        &self,
        records: &[NormalizedRecord],
        matches: &[EntityMatch],
    ) -> Vec<AggregateRow> {
        // Only records with scored words carry meaningful sentiment.
        let qualifying: Vec<&NormalizedRecord> =
            records.iter().filter(|r| r.word_count > 0).collect();

        let mut labels_by_url: HashMap<&str, Vec<&str>> = HashMap::new();
        for m in matches {
            labels_by_url
                .entry(m.record_url.as_str())
                .or_default()
                .push(m.entity_label.as_str());
        }

        let mut groups: BTreeMap<(String, Option<String>, TimeBucket), Vec<f64>> =
            BTreeMap::new();
        let mut seq_counters: HashMap<String, u64> = HashMap::new();

        for record in &qualifying {
            let bucket = match self.bucket_for(record, &mut seq_counters) {
                Some(b) => b,
                None => continue,
            };

            groups
                .entry((record.source.clone(), None, bucket))
                .or_default()
                .push(record.avg_sentiment);

            if let Some(labels) = labels_by_url.get(record.url.as_str()) {
                for label in labels {
                    groups
                        .entry((record.source.clone(), Some(label.to_string()), bucket))
                        .or_default()
                        .push(record.avg_sentiment);
                }
            }
        }

        let mut rows: Vec<AggregateRow> = groups
            .into_iter()
            .map(|((source, entity_label, bucket), sentiments)| AggregateRow {
                bucket,
                source,
                entity_label,
                article_count: sentiments.len() as u32,
                mean_sentiment: mean(&sentiments),
                median_sentiment: median(&sentiments),
                smoothed_sentiment: None,
            })
            .collect();

        self.smooth(&mut rows);

        debug!(
            "Aggregator: {} rows from {} qualifying records under {} policy",
            rows.len(),
            qualifying.len(),
            self.policy.label()
        );

        rows
    }

    /// Assign the bucket for one record under the active policy, or `None`
    /// when the record lacks the field the policy keys on.
    fn bucket_for(
        &self,
        record: &NormalizedRecord,
        seq_counters: &mut HashMap<String, u64>,
    ) -> Option<TimeBucket> {
        match self.policy {
            GranularityPolicy::Daily { weekly } => {
                let date = record.publish_date.as_date()?;
                if weekly {
                    Some(TimeBucket::Week(date.week(Weekday::Mon).first_day()))
                } else {
                    Some(TimeBucket::Day(date))
                }
            }
            GranularityPolicy::Hourly => {
                Some(TimeBucket::Hour(truncate_to_hour(record.scrape_time?)))
            }
            GranularityPolicy::Sequential => {
                let counter = seq_counters.entry(record.source.clone()).or_insert(0);
                let index = *counter;
                *counter += 1;
                Some(TimeBucket::Seq(index))
            }
        }
    }

    /// Centered rolling mean over each `(source, entity_label)` series.
    ///
    /// The effective window is the configured width capped at the series
    /// length and rounded down to the nearest odd number (floor 1). Buckets
    /// whose centered window would run past a series boundary stay `None`
    /// rather than shrinking the window, so every smoothed value averages
    /// the same number of buckets.
    fn smooth(&self, rows: &mut [AggregateRow]) {
        let mut start = 0;
        while start < rows.len() {
            let mut end = start + 1;
            while end < rows.len()
                && rows[end].source == rows[start].source
                && rows[end].entity_label == rows[start].entity_label
            {
                end += 1;
            }

            let series = &mut rows[start..end];
            let n = series.len();
            let mut window = self.smoothing_window.max(1).min(n);
            if window % 2 == 0 {
                window -= 1;
            }
            let window = window.max(1);
            let half = window / 2;

            let means: Vec<f64> = series.iter().map(|r| r.mean_sentiment).collect();
            for (i, row) in series.iter_mut().enumerate() {
                if i >= half && i + half < n {
                    row.smoothed_sentiment = Some(mean(&means[i - half..=i + half]));
                }
            }

            start = end;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
