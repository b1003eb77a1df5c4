use anyhow::{Context, Result};
use analyzer::{ChartRenderer, Reporter, TrendingAnalyzer};
use crate::config::AnalysisConfig;
use loader::DatasetLoader;
use processor::{CategoryFlattener, CategoryJoiner, ColumnNormalizer, RecordCleaner};
use std::env;
use storage::CsvStorage;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod analyzer;
mod config;
mod loader;
mod models;
mod processor;
mod storage;

fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let skip_charts = args.iter().any(|arg| arg == "--no-charts");
    let config_path = args.iter().find(|arg| !arg.starts_with("--"));

    let config = match config_path {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load analysis configuration from {}", path))?,
        None => AnalysisConfig::load().context("Failed to load analysis configuration")?,
    };

    info!("🚀 Starting YouTube trending analysis");
    info!(
        "Dataset: {} | Categories: {}",
        config.paths.dataset.display(),
        config.paths.categories.display()
    );

    let cleaned = run_pipeline(&config)?;

    let analyzer = TrendingAnalyzer::new(config.analysis.clone());
    let report = analyzer.analyze(&cleaned)?;
    Reporter::new().print_report(&report);

    if skip_charts {
        warn!("⚠️ Chart rendering skipped (--no-charts)");
    } else {
        let charts = ChartRenderer::new(&config.paths.chart_dir).render_all(&report, &cleaned)?;
        for chart in &charts {
            info!("Chart written: {}", chart.display());
        }
    }

    info!("🎉 Analysis completed successfully!");
    Ok(())
}

/// Load, join, clean and persist; returns the cleaned table held in memory
fn run_pipeline(config: &AnalysisConfig) -> Result<polars::prelude::DataFrame> {
    let loader = DatasetLoader::new(config.delimiter_byte()?);
    let normalizer = ColumnNormalizer::new();
    let flattener = CategoryFlattener::new();
    let joiner = CategoryJoiner::new();
    let cleaner = RecordCleaner::new();
    let storage = CsvStorage::new();

    let mut trending = loader.load_trending_dataset(&config.paths.dataset)?;
    normalizer.normalize_dataframe(&mut trending)?;
    info!("Normalized column names: {:?}", trending.get_column_names());

    let document = loader.load_category_document(&config.paths.categories)?;
    let lookup = flattener.flatten_to_dataframe(&document)?;

    let joined = joiner.join(&trending, &lookup)?;

    let mut cleaned = cleaner.clean_dataframe(&joined)?;
    info!("Cleaned table has {} rows", cleaned.height());

    storage.write_cleaned(&mut cleaned, &config.paths.cleaned_output)?;
    storage.verify_round_trip(&cleaned, &config.paths.cleaned_output)?;

    Ok(cleaned)
}
