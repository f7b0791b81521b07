//! Taxi fare CLI module
//!
//! Command-line flags layered over the JSON config file and built-in
//! defaults, and the train → save → reload → evaluate → predict run.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::config::AppConfig;
use crate::data::{test_trips, DataLoader};
use crate::export::ModelSerializer;
use crate::inference::{Evaluator, Predictor};
use crate::preprocessing::HandleUnknown;
use crate::training::TrainedModel;

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Default)]
#[command(name = "taxi-fare")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a taxi fare regression model, evaluate it and predict a sample trip")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the data and model files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Training data file, relative to the data directory
    #[arg(long)]
    pub train_file: Option<PathBuf>,

    /// Test data file, relative to the data directory
    #[arg(long)]
    pub test_file: Option<PathBuf>,

    /// Model output file, relative to the data directory
    #[arg(long)]
    pub model_file: Option<PathBuf>,

    /// Fail on categories not seen during training instead of ignoring them
    #[arg(long)]
    pub strict_categories: bool,
}

impl Cli {
    /// Resolve defaults, then the config file, then flags
    pub fn resolve_config(&self) -> crate::error::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_json_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        if let Some(file) = &self.train_file {
            config = config.with_train_file(file);
        }
        if let Some(file) = &self.test_file {
            config = config.with_test_file(file);
        }
        if let Some(file) = &self.model_file {
            config = config.with_model_file(file);
        }
        if self.strict_categories {
            config = config.with_handle_unknown(HandleUnknown::Error);
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Run ───────────────────────────────────────────────────────────────────────

/// Train, persist, reload, evaluate and predict, writing results to `out`.
///
/// Output is exactly three lines: `Rms = ..`, `RSquared = ..` and the
/// sample trip prediction. Progress goes to the log, not to `out`.
pub async fn run(config: &AppConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let start = Instant::now();
    let loader = DataLoader::new(config.loader.clone());

    let train_path = config.train_path();
    let records = loader.load_all(&train_path)?;
    let model = config.pipeline().fit(&records)?;

    let model_path = config.model_path();
    model.save_async(&model_path).await?;

    let model = TrainedModel::load(&model_path)?;
    let metrics = Evaluator::new(loader).evaluate(&model, config.test_path())?;
    writeln!(out, "Rms = {}", metrics.rms)?;
    writeln!(out, "RSquared = {}", metrics.r_squared)?;

    let prediction = Predictor::new(&model).predict(&test_trips::trip1())?;
    writeln!(
        out,
        "Predicted fare: {}, actual fare: {}",
        prediction.fare_amount,
        test_trips::TRIP1_ACTUAL_FARE
    )?;

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        model = %model_path.display(),
        "Run complete"
    );
    Ok(())
}
