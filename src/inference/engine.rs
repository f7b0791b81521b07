//! Evaluation and prediction with a fitted model
//!
//! Both paths replay the model's fitted transforms and score rows through
//! the same per-row tree traversal, so a single prediction is bit-for-bit
//! equal to the matching row of an evaluation run.

use super::FarePrediction;
use crate::data::{DataLoader, TripRecord};
use crate::error::{Result, TaxiFareError};
use crate::preprocessing::TransformMode;
use crate::training::{RegressionMetrics, TrainedModel};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Computes aggregate metrics of a model over a labeled file
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    loader: DataLoader,
}

impl Evaluator {
    pub fn new(loader: DataLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &DataLoader {
        &self.loader
    }

    /// Score every row of `path` and compare against its labels
    pub fn evaluate(&self, model: &TrainedModel, path: impl AsRef<Path>) -> Result<RegressionMetrics> {
        let path = path.as_ref();
        let start = Instant::now();

        let header = self.loader.read_header(path)?;
        let target = &model.metadata().target_name;
        for column in model.input_columns().iter().filter(|c| *c != target) {
            if !header.contains(column) {
                return Err(TaxiFareError::DataMismatch(format!(
                    "{} has no '{}' column, which the model was trained on",
                    path.display(),
                    column
                )));
            }
        }

        let records = self.loader.load_all(path)?;
        if records.is_empty() {
            return Err(TaxiFareError::DataMismatch(format!(
                "{} has no rows to evaluate",
                path.display()
            )));
        }

        let features = model.featurize(&records, TransformMode::Labeled)?;
        let labels = features
            .labels()
            .ok_or_else(|| TaxiFareError::ColumnNotFound(model.config().label_column.clone()))?;
        let predictions = model.score(&features)?;
        let metrics = RegressionMetrics::compute(labels, &predictions)?;

        info!(
            path = %path.display(),
            rows = metrics.n_samples,
            rms = metrics.rms,
            r_squared = metrics.r_squared,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Evaluated model"
        );
        debug!(mae = metrics.mae, mse = metrics.mse, "Error breakdown");

        Ok(metrics)
    }
}

/// Predicts fares for unlabeled records
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    model: &'a TrainedModel,
}

impl<'a> Predictor<'a> {
    pub fn new(model: &'a TrainedModel) -> Self {
        Self { model }
    }

    /// Predict the fare of one trip
    pub fn predict(&self, record: &TripRecord) -> Result<FarePrediction> {
        let predictions = self.predict_batch(std::slice::from_ref(record))?;
        predictions
            .into_iter()
            .next()
            .ok_or_else(|| TaxiFareError::DataMismatch("no prediction produced".to_string()))
    }

    /// Predict fares for several trips, in input order
    pub fn predict_batch(&self, records: &[TripRecord]) -> Result<Vec<FarePrediction>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let features = self.model.featurize(records, TransformMode::Unlabeled)?;
        let scores = self.model.score(&features)?;
        Ok(scores
            .iter()
            .map(|&fare_amount| FarePrediction { fare_amount })
            .collect())
    }
}
