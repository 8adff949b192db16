//! Core types and pure per-record logic for the news-pulse pipeline.
//!
//! Everything in this crate is a stateless, per-record transformation:
//! date normalization, entity attribution, configuration, and the shared
//! data model. Dataset-level operations (merging, granularity selection,
//! aggregation) live in `pulse-data`.

pub mod config;
pub mod dates;
pub mod entities;
pub mod error;
pub mod models;
pub mod settings;
