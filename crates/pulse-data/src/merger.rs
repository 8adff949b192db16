//! Merging of raw record batches across overlapping scrape runs.
//!
//! Scrape runs overlap, outlets spell their own names inconsistently, and
//! some records arrive without a URL. The merger concatenates batches in
//! order, drops structurally incomplete records, collapses source-name
//! variants, deduplicates on `(trimmed title, canonical source)` keeping
//! the first occurrence, and assigns synthetic URLs so downstream joins
//! never collide on a shared placeholder key.

use std::collections::HashSet;

use pulse_core::config::PipelineConfig;
use pulse_core::models::RawRecord;
use tracing::debug;

// ── MergeReport ───────────────────────────────────────────────────────────────

/// The merged record set plus the per-run data-quality metrics.
///
/// Dropped-record counts are reported to the caller rather than silently
/// swallowed.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Merged records in input-relative order.
    pub records: Vec<RawRecord>,
    /// Records dropped for a missing/blank title, content, or source.
    pub dropped_incomplete: usize,
    /// Records dropped as duplicates of an earlier occurrence.
    pub duplicates_removed: usize,
}

// ── RecordMerger ──────────────────────────────────────────────────────────────

/// Combines raw batches into one deduplicated, canonicalized record set.
pub struct RecordMerger<'a> {
    config: &'a PipelineConfig,
}

impl<'a> RecordMerger<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Merge `batches` into a single record sequence.
    ///
    /// Output preserves input relative order and the operation is
    /// idempotent: re-running on its own output changes nothing.
    pub fn merge(&self, batches: Vec<Vec<RawRecord>>) -> MergeReport {
        let mut report = MergeReport::default();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        let flattened: Vec<RawRecord> = batches.into_iter().flatten().collect();
        // Entity matches join on URL, so a synthetic key must never shadow a
        // literal input URL of the same shape.
        let mut taken_urls: HashSet<String> = flattened
            .iter()
            .map(|r| r.url.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        let mut next_synthetic = 0usize;

        for mut record in flattened {
            let title = record.title.trim();
            if title.is_empty() || record.content.trim().is_empty() || record.source.trim().is_empty()
            {
                report.dropped_incomplete += 1;
                continue;
            }

            record.source = self.config.canonical_source(&record.source);

            let key = (title.to_string(), record.source.clone());
            if !seen.insert(key) {
                report.duplicates_removed += 1;
                continue;
            }

            if record.url.trim().is_empty() {
                record.url = loop {
                    let candidate = format!("urn:record:{}", next_synthetic);
                    next_synthetic += 1;
                    if taken_urls.insert(candidate.clone()) {
                        break candidate;
                    }
                };
            }

            report.records.push(record);
        }

        debug!(
            "RecordMerger: kept {}, dropped {} incomplete, removed {} duplicates",
            report.records.len(),
            report.dropped_incomplete,
            report.duplicates_removed,
        );

        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
