//! Dataset-level layer for the news-pulse pipeline.
//!
//! Responsible for discovering and reading JSONL batch files, merging
//! overlapping scrape runs, selecting the aggregation granularity, building
//! the aggregate table, and running the top-level pipeline.

pub mod aggregator;
pub mod export;
pub mod granularity;
pub mod merger;
pub mod pipeline;
pub mod reader;

pub use pulse_core as core;
