//! JSONL batch discovery and loading.
//!
//! Each scrape run produces one `.jsonl` file with one article record per
//! line. Files are discovered recursively and loaded in sorted-path order so
//! that concatenation order — which later feeds sequence bucketing and
//! first-occurrence deduplication — is deterministic across runs.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use pulse_core::error::{PipelineError, Result};
use pulse_core::models::RawRecord;
use tracing::{debug, warn};

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Find all `.jsonl` files recursively under `data_path`, sorted by path.
pub fn find_batch_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load every batch file under `data_path` into per-file record vectors.
///
/// A missing data path or an empty directory is a structural error; a
/// malformed line or an unreadable file is not — those are skipped with a
/// log line, since a partial batch is still a usable batch.
pub fn load_batches(data_path: &Path) -> Result<Vec<Vec<RawRecord>>> {
    if !data_path.exists() {
        return Err(PipelineError::DataPathNotFound(data_path.to_path_buf()));
    }

    let files = find_batch_files(data_path);
    if files.is_empty() {
        return Err(PipelineError::NoBatchFiles(data_path.to_path_buf()));
    }

    let mut batches: Vec<Vec<RawRecord>> = Vec::with_capacity(files.len());
    for file_path in &files {
        batches.push(read_batch_file(file_path));
    }

    debug!(
        "Loaded {} records from {} batch files",
        batches.iter().map(|b| b.len()).sum::<usize>(),
        batches.len()
    );

    Ok(batches)
}

/// Read one batch file, skipping blank and malformed lines.
fn read_batch_file(file_path: &Path) -> Vec<RawRecord> {
    let file = match std::fs::File::open(file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to read file {}: {}", file_path.display(), e);
            return Vec::new();
        }
    };

    let reader = std::io::BufReader::new(file);
    let mut records: Vec<RawRecord> = Vec::new();
    let mut lines_read = 0u64;
    let mut lines_skipped = 0u64;

    for line_result in reader.lines() {
        let line = match line_result {
            Ok(l) => l,
            Err(_) => continue,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        lines_read += 1;

        match serde_json::from_str::<RawRecord>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                lines_skipped += 1;
                debug!(
                    "Skipping malformed line in {}: {}",
                    file_path.display(),
                    e
                );
            }
        }
    }

    debug!(
        "Batch {}: {} lines read, {} skipped",
        file_path.display(),
        lines_read,
        lines_skipped,
    );

    records
}

// ── Tests ─────────────────────────────────────────────────────────────────────
