use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use unitmatch::config::{EngineOptions, MeasuresConfig};
use unitmatch::feature_flow::{FeatureValidator, RecordPair, RowValidation};
use unitmatch::measures_engine::MeasuresEngine;
use unitmatch::progress::Reporter;

/// Compare product description pairs by their units of measure
#[derive(Parser)]
#[command(name = "unitmatch", version)]
struct Args {
    /// JSON array of `{"client": ..., "source": ...}` pairs
    pairs: PathBuf,

    /// Measures configuration; the built-in catalog when omitted
    #[arg(short, long, env = "UNITMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Worker threads for row offloading; runs on the main thread when omitted
    #[arg(short, long, env = "UNITMATCH_WORKERS", value_parser = clap::value_parser!(u16).range(1..))]
    workers: Option<u16>,
}

#[derive(Serialize)]
struct PairReport<'a> {
    client: &'a str,
    source: &'a str,
    client_regex: &'a str,
    source_regex: &'a str,
    validation: &'a RowValidation,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MeasuresConfig::from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => MeasuresConfig::builtin()?,
    };

    let pool = match args.workers {
        Some(threads) => Some(
            ThreadPoolBuilder::new()
                .num_threads(usize::from(threads))
                .build()?,
        ),
        None => None,
    };

    let content = fs::read_to_string(&args.pairs)
        .with_context(|| format!("failed to read {}", args.pairs.display()))?;
    let pairs: Vec<RecordPair> = serde_json::from_str(&content).context("malformed pairs file")?;
    info!("Loaded {} pairs from {}", pairs.len(), args.pairs.display());

    let reporter = Reporter::new()
        .with_status(|message| info!("{message}"))
        .with_progress(|percent| info!("{percent}%"));

    let engine = MeasuresEngine::from_config(&config, EngineOptions::default())?
        .with_reporter(reporter.clone());
    let client_texts: Vec<String> = pairs.iter().map(|pair| pair.client.clone()).collect();
    let source_texts: Vec<String> = pairs.iter().map(|pair| pair.source.clone()).collect();
    let client_regexes = engine.composite_regexes(&client_texts, pool.as_ref())?;
    let source_regexes = engine.composite_regexes(&source_texts, pool.as_ref())?;

    let validator = FeatureValidator::from_config(&config)?.with_reporter(reporter);
    let validations = validator.validate(&pairs, pool.as_ref())?;

    let reports: Vec<PairReport> = pairs
        .iter()
        .zip(&validations)
        .enumerate()
        .map(|(row, (pair, validation))| PairReport {
            client: &pair.client,
            source: &pair.source,
            client_regex: &client_regexes[row],
            source_regex: &source_regexes[row],
            validation,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
