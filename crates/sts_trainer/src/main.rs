//! STS Trainer CLI
//!
//! Trains a sentence-pair similarity predictor and prints its test metrics.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use sts_trainer::{pipeline, PredictorSource, RunConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sts-train")]
#[command(author = "STS Trainer Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and evaluate a semantic textual similarity regressor", long_about = None)]
struct Args {
    /// TOML run configuration; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Training CSV (id, anchor, target, context, score)
    #[arg(long)]
    train: Option<PathBuf>,

    /// Test CSV with the same layout
    #[arg(long)]
    test: Option<PathBuf>,

    /// Predictor directory to load from and save to
    #[arg(long)]
    predictor_path: Option<PathBuf>,

    /// Where the predictor comes from
    #[arg(long, value_enum)]
    predictor_source: Option<PredictorSource>,

    /// Train on the full training set instead of a debug sample
    #[arg(long)]
    full: bool,

    /// Training time limit in seconds
    #[arg(long)]
    time_limit: Option<u64>,

    /// Debug sample size
    #[arg(long)]
    sample_size: Option<usize>,

    /// Seed for debug sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RunConfig::default(),
        };

        if let Some(path) = self.train {
            config.train_path = path;
        }
        if let Some(path) = self.test {
            config.test_path = path;
        }
        if let Some(path) = self.predictor_path {
            config.predictor_path = path;
        }
        if let Some(source) = self.predictor_source {
            config.predictor_source = source;
        }
        if self.full {
            config.debug = false;
        }
        if let Some(seconds) = self.time_limit {
            config.time_limit_seconds = seconds;
        }
        if let Some(n) = self.sample_size {
            config.sample_size = n;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("STS Trainer v{}", env!("CARGO_PKG_VERSION"));

    let config = args.into_config()?;
    info!("Run configuration:");
    info!("  Debug sampling: {} ({} rows, seed {})", config.debug, config.sample_size, config.seed);
    info!("  Predictor: {} ({:?})", config.predictor_path.display(), config.predictor_source);
    info!("  Time limit: {}s", config.time_limit_seconds);

    pipeline::run(&config).context("Training run failed")?;

    info!("✓ Run completed successfully");
    Ok(())
}
