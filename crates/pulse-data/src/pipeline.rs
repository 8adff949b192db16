//! End-to-end pipeline orchestration.
//!
//! Wires the stages together in their fixed order: load batches, merge,
//! normalize dates, attribute entities (when requested), select the
//! granularity policy, aggregate. Each run recomputes everything from the
//! raw batches; there is no incremental state between runs.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use pulse_core::config::PipelineConfig;
use pulse_core::dates::{parse_scrape_timestamp, DateNormalizer};
use pulse_core::entities::EntityAttributor;
use pulse_core::error::{PipelineError, Result};
use pulse_core::models::{AggregateRow, EntityMatch, GranularityPolicy, NormalizedRecord, RawRecord};
use serde::Serialize;
use tracing::info;

use crate::aggregator::Aggregator;
use crate::granularity::GranularitySelector;
use crate::merger::RecordMerger;
use crate::reader::load_batches;

// ── Run metadata ──────────────────────────────────────────────────────────────

/// Data-quality and provenance summary for one pipeline run.
///
/// Exported next to the aggregate rows so a consumer can judge how much
/// signal the table is built on without re-reading the batches.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetadata {
    /// RFC 3339 timestamp of this run.
    pub generated_at: String,
    pub batches_loaded: usize,
    /// Records read across all batches, before any filtering.
    pub records_read: usize,
    pub dropped_incomplete: usize,
    pub duplicates_removed: usize,
    /// Merged records whose publish date resisted every parse attempt.
    pub unparseable_dates: usize,
    /// Label of the selected granularity policy.
    pub policy: String,
    pub elapsed_seconds: f64,
}

/// Everything a caller needs from one run: the table, the policy that
/// shaped it, and the run metadata.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub policy: GranularityPolicy,
    pub rows: Vec<AggregateRow>,
    pub metadata: PipelineMetadata,
}

// ── Stages ────────────────────────────────────────────────────────────────────

/// Attach canonical date and scrape-time fields to merged records.
pub fn normalize_records(records: Vec<RawRecord>, config: &PipelineConfig) -> Vec<NormalizedRecord> {
    let normalizer = DateNormalizer::new(config.min_year, config.default_year);

    records
        .into_iter()
        .map(|r| NormalizedRecord {
            publish_date: normalizer.normalize(r.publish_date.as_deref()),
            scrape_time: parse_scrape_timestamp(r.scraped_at.as_deref()),
            url: r.url,
            title: r.title,
            content: r.content,
            source: r.source,
            matched_keywords: r.matched_keywords,
            avg_sentiment: r.avg_sentiment,
            word_count: r.word_count,
        })
        .collect()
}

// ── run_pipeline ──────────────────────────────────────────────────────────────

/// Run the full pipeline over the batch directory at `data_path`.
///
/// The configuration is re-validated here, not only at file-load time,
/// because CLI overrides are folded in after loading and a default config
/// is never loaded from a file at all.
///
/// `entities` switches per-entity aggregation on; it is an error to request
/// it with no lookup tables configured, since the run would silently
/// produce the source-level table the caller did not ask for.
pub fn run_pipeline(
    data_path: &Path,
    config: &PipelineConfig,
    entities: bool,
) -> Result<PipelineResult> {
    config.validate()?;
    if entities && !config.has_entity_tables() {
        return Err(PipelineError::EmptyLookup);
    }

    let started = Instant::now();

    let batches = load_batches(data_path)?;
    let batches_loaded = batches.len();
    let records_read: usize = batches.iter().map(|b| b.len()).sum();

    let report = RecordMerger::new(config).merge(batches);
    let dropped_incomplete = report.dropped_incomplete;
    let duplicates_removed = report.duplicates_removed;

    let normalized = normalize_records(report.records, config);
    let unparseable_dates = normalized
        .iter()
        .filter(|r| !r.publish_date.is_parsed())
        .count();

    let matches: Vec<EntityMatch> = if entities {
        let attributor = EntityAttributor::from_config(config);
        normalized
            .iter()
            .flat_map(|r| attributor.attribute(r))
            .collect()
    } else {
        Vec::new()
    };

    let selector = GranularitySelector::new(config.min_distinct_dates, config.weekly_range_days);
    let policy = selector.select(&normalized);

    let rows = Aggregator::new(policy, config.smoothing_window).aggregate(&normalized, &matches);

    let metadata = PipelineMetadata {
        generated_at: Utc::now().to_rfc3339(),
        batches_loaded,
        records_read,
        dropped_incomplete,
        duplicates_removed,
        unparseable_dates,
        policy: policy.label().to_string(),
        elapsed_seconds: started.elapsed().as_secs_f64(),
    };

    info!(
        "Pipeline complete: {} rows ({}) from {} records in {:.3}s",
        rows.len(),
        metadata.policy,
        records_read,
        metadata.elapsed_seconds
    );

    Ok(PipelineResult {
        policy,
        rows,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
