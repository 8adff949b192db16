use clap::Parser;
use std::path::PathBuf;

use crate::config::PipelineConfig;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Time-ordered sentiment aggregation for scraped news batches
#[derive(Parser, Debug, Clone)]
#[command(
    name = "news-pulse",
    about = "Time-ordered sentiment aggregation for scraped news batches",
    version
)]
pub struct Settings {
    /// Directory containing JSONL batch files
    #[arg(long, default_value = "data")]
    pub data_path: PathBuf,

    /// Pipeline configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file for the aggregate table
    #[arg(long, default_value = "aggregates.json")]
    pub output: PathBuf,

    /// Produce per-entity aggregates in addition to source-level ones
    #[arg(long)]
    pub entities: bool,

    /// Rolling-average window in buckets (overrides the config file)
    #[arg(long)]
    pub window: Option<usize>,

    /// Minimum distinct publish dates required for daily bucketing
    #[arg(long)]
    pub min_distinct_dates: Option<usize>,

    /// Assumed year for year-less publish dates (disabled unless set)
    #[arg(long)]
    pub default_year: Option<i32>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Fold explicit CLI overrides into a loaded configuration.
    ///
    /// CLI always wins over the configuration file; unset flags leave the
    /// file's values untouched.
    pub fn apply_to(&self, config: &mut PipelineConfig) {
        if let Some(window) = self.window {
            config.smoothing_window = window;
        }
        if let Some(min) = self.min_distinct_dates {
            config.min_distinct_dates = min;
        }
        if let Some(year) = self.default_year {
            config.default_year = Some(year);
        }
    }

    /// The effective logging level, with `--debug` taking precedence.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
