use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the news-pulse pipeline.
///
/// Per-record anomalies (unparseable dates, missing keywords, no entity
/// match) are *not* errors — they are typed-absent values carried through
/// the pipeline as data. Only structural problems surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entity aggregation was requested but no lookup tables are configured.
    #[error("Entity aggregation requested but candidate and theme lookup tables are both empty")]
    EmptyLookup,

    /// The expected batch directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No JSONL batch files were found under the given directory.
    #[error("No JSONL batch files found in {0}")]
    NoBatchFiles(PathBuf),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the pulse crates.
pub type Result<T> = std::result::Result<T, PipelineError>;
