//! End-to-end training run
//!
//! Load -> normalize -> report -> obtain predictor -> (sample) -> fit ->
//! evaluate -> print. Strictly sequential; the first error aborts the run.

use std::borrow::Cow;
use std::io::{self, Write};
use sts_core::EvaluationReport;

use crate::config::{PredictorSource, RunConfig};
use crate::dataset::{load_normalized, value_range, ColumnNormalizer};
use crate::deterministic::LcgRng;
use crate::errors::TrainerError;
use crate::predictor::{Predictor, TextPredictor};
use crate::table::Table;

/// Loaded and normalized train/test tables
#[derive(Clone, Debug)]
pub struct PreparedData {
    pub train: Table,
    pub test: Table,
}

/// Run the whole pipeline, printing to stdout
pub fn run(config: &RunConfig) -> Result<EvaluationReport, TrainerError> {
    config.validate()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let data = prepare_data(config)?;
    report_datasets(config, &data, &mut out)?;

    let mut predictor = obtain_predictor(config)?;
    train_and_evaluate(config, &mut predictor, &data, &mut out)
}

/// Run the whole pipeline with a caller-supplied predictor and output sink
pub fn run_with<P: Predictor, W: Write>(
    config: &RunConfig,
    predictor: &mut P,
    out: &mut W,
) -> Result<EvaluationReport, TrainerError> {
    config.validate()?;
    let data = prepare_data(config)?;
    report_datasets(config, &data, out)?;
    train_and_evaluate(config, predictor, &data, out)
}

/// Loader and column normalizer stages
pub fn prepare_data(config: &RunConfig) -> Result<PreparedData, TrainerError> {
    let normalizer = ColumnNormalizer::default();
    let train = load_normalized(&config.train_path, &config.id_column, &normalizer)?;
    let test = load_normalized(&config.test_path, &config.id_column, &normalizer)?;
    Ok(PreparedData { train, test })
}

/// Either continue a saved predictor or start a new one
pub fn obtain_predictor(config: &RunConfig) -> Result<TextPredictor, TrainerError> {
    match config.predictor_source {
        PredictorSource::LoadPretrained => TextPredictor::load_pretrained(&config.predictor_path),
        PredictorSource::CreateFresh => {
            tracing::info!(
                "Creating fresh predictor for label '{}' at {}",
                config.label,
                config.predictor_path.display()
            );
            Ok(TextPredictor::create_fresh(&config.label, &config.predictor_path)
                .with_params(config.training.clone()))
        }
    }
}

/// Print previews, row count and label range
pub fn report_datasets<W: Write>(
    config: &RunConfig,
    data: &PreparedData,
    out: &mut W,
) -> Result<(), TrainerError> {
    writeln!(out, "{}", data.train.head(config.preview_rows))?;
    writeln!(out, "{}", data.test.head(config.preview_rows))?;

    writeln!(out, "Total number of training data: {}", data.train.len())?;

    let scores = data.train.numeric_column(&config.label)?;
    let (min, max) = value_range(&scores)
        .ok_or_else(|| TrainerError::Dataset("training set is empty".to_string()))?;
    writeln!(out, "{}", format_score_range(min, max))?;
    Ok(())
}

/// Debug mode: seeded sample of `sample_size` rows; otherwise the full table
pub fn select_training_set<'a>(config: &RunConfig, train: &'a Table) -> Result<Cow<'a, Table>, TrainerError> {
    if config.debug {
        let mut rng = LcgRng::new(config.seed);
        Ok(Cow::Owned(train.sample(config.sample_size, &mut rng)?))
    } else {
        Ok(Cow::Borrowed(train))
    }
}

/// Trainer and evaluator stages
pub fn train_and_evaluate<P: Predictor, W: Write>(
    config: &RunConfig,
    predictor: &mut P,
    data: &PreparedData,
    out: &mut W,
) -> Result<EvaluationReport, TrainerError> {
    if config.debug {
        writeln!(out, "Training model...")?;
    }
    let training_set = select_training_set(config, &data.train)?;
    if config.debug {
        writeln!(out, "Training data size: {}", training_set.len())?;
    }

    let summary = predictor.fit(&training_set, config.time_limit())?;
    tracing::info!(
        "Fit finished in {:.1}s: {} trees added ({} total), {}",
        summary.elapsed.as_secs_f64(),
        summary.trees_added,
        summary.total_trees,
        summary.stop_reason
    );

    let report = predictor.evaluate(&data.test, &config.metrics)?;
    write!(out, "{report}")?;
    out.flush()?;

    Ok(report)
}

/// `Min score= 1.0 , Max score= 5.0`
pub fn format_score_range(min: f64, max: f64) -> String {
    format!("Min score= {} , Max score= {}", format_float(min), format_float(max))
}

/// Shortest round-trip form, always with a decimal point for finite values
fn format_float(value: f64) -> String {
    format!("{value:?}")
}
