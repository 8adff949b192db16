mod bootstrap;

use anyhow::Result;
use clap::Parser;
use pulse_core::config::PipelineConfig;
use pulse_core::settings::Settings;
use pulse_data::export::write_aggregates;
use pulse_data::pipeline::run_pipeline;

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;

    tracing::info!("news-pulse v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match &settings.config {
        Some(path) => PipelineConfig::load_from(path)?,
        None => PipelineConfig::default(),
    };
    settings.apply_to(&mut config);

    let result = run_pipeline(&settings.data_path, &config, settings.entities)?;
    write_aggregates(&settings.output, &result)?;

    println!(
        "{} aggregation: {} rows from {} records ({} incomplete, {} duplicates, {} unparseable dates)",
        result.policy.label(),
        result.rows.len(),
        result.metadata.records_read,
        result.metadata.dropped_incomplete,
        result.metadata.duplicates_removed,
        result.metadata.unparseable_dates,
    );

    // Per-source one-line summary over the source-level rows.
    let mut per_source: Vec<(&str, u32, f64)> = Vec::new();
    for row in result.rows.iter().filter(|r| r.entity_label.is_none()) {
        match per_source.iter_mut().find(|(s, _, _)| *s == row.source) {
            Some((_, count, weighted)) => {
                *count += row.article_count;
                *weighted += row.mean_sentiment * f64::from(row.article_count);
            }
            None => per_source.push((
                &row.source,
                row.article_count,
                row.mean_sentiment * f64::from(row.article_count),
            )),
        }
    }
    for (source, count, weighted) in &per_source {
        println!(
            "  {}: {} articles, mean sentiment {:+.3}",
            source,
            count,
            weighted / f64::from(*count)
        );
    }

    println!("Wrote {}", settings.output.display());

    Ok(())
}
