//! JSON export of the aggregate table.

use std::path::Path;

use pulse_core::error::Result;
use pulse_core::models::AggregateRow;
use serde::Serialize;
use tracing::debug;

use crate::pipeline::{PipelineMetadata, PipelineResult};

// ── ExportDocument ────────────────────────────────────────────────────────────

/// The on-disk shape of one exported run.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    /// Granularity-policy label; tells a consumer how to read `bucket`.
    pub granularity: &'a str,
    pub metadata: &'a PipelineMetadata,
    pub rows: &'a [AggregateRow],
}

/// Write the aggregate table to `path` as pretty-printed JSON.
///
/// Writes to a sibling temp file first and renames into place, so a crash
/// mid-write never leaves a truncated document behind.
pub fn write_aggregates(path: &Path, result: &PipelineResult) -> Result<()> {
    let document = ExportDocument {
        granularity: result.policy.label(),
        metadata: &result.metadata,
        rows: &result.rows,
    };
    let json = serde_json::to_string_pretty(&document)?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json)?;
    std::fs::rename(&tmp_path, path)?;

    debug!(
        "Wrote {} aggregate rows to {}",
        result.rows.len(),
        path.display()
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pulse_core::models::{GranularityPolicy, TimeBucket};
    use tempfile::TempDir;

    fn sample_result() -> PipelineResult {
        PipelineResult {
            policy: GranularityPolicy::Daily { weekly: false },
            rows: vec![AggregateRow {
                bucket: TimeBucket::Day(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()),
                source: "A".to_string(),
                entity_label: None,
                article_count: 2,
                mean_sentiment: 0.3,
                median_sentiment: 0.3,
                smoothed_sentiment: None,
            }],
            metadata: PipelineMetadata {
                generated_at: "2025-08-02T10:00:00+00:00".to_string(),
                batches_loaded: 1,
                records_read: 2,
                dropped_incomplete: 0,
                duplicates_removed: 0,
                unparseable_dates: 0,
                policy: "daily".to_string(),
                elapsed_seconds: 0.01,
            },
        }
    }

    #[test]
    fn test_write_aggregates_round_trips_as_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aggregates.json");
        write_aggregates(&path, &sample_result()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["granularity"], "daily");
        assert_eq!(value["metadata"]["records_read"], 2);
        assert_eq!(value["rows"][0]["bucket"], "2025-08-01");
        assert_eq!(value["rows"][0]["article_count"], 2);
        assert_eq!(value["rows"][0]["smoothed_sentiment"], serde_json::Value::Null);
    }

    #[test]
    fn test_write_aggregates_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aggregates.json");
        write_aggregates(&path, &sample_result()).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["aggregates.json"]);
    }
}
