//! Learning pipeline: an ordered list of tagged steps applied by folding

use super::{
    config::{taxi_fare_steps, HandleUnknown, PipelineStep},
    encoder::CategoricalEncoder,
    FeatureSet,
};
use crate::data::{records_to_frame, TripRecord};
use crate::error::{Result, TaxiFareError};
use crate::training::{BoostingConfig, GradientBoostingRegressor, TrainedModel, Trainer};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Whether transformed data is expected to carry labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    Labeled,
    /// Label copies whose source column is absent are skipped
    Unlabeled,
}

/// A pipeline step after fitting, replayed identically on new data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedTransform {
    CopyColumn { source: String, target: String },
    OneHot(CategoricalEncoder),
    /// `features` lists the expanded input columns in output order
    Concatenate { output: String, features: Vec<String> },
}

/// Columns and assembled feature matrices flowing between steps
#[derive(Debug, Clone)]
pub struct TransformState {
    pub frame: DataFrame,
    pub matrices: HashMap<String, (Array2<f64>, Vec<String>)>,
}

impl TransformState {
    pub fn new(frame: DataFrame) -> Self {
        Self {
            frame,
            matrices: HashMap::new(),
        }
    }

    /// Pull the named feature matrix, and optionally the label column
    pub fn into_feature_set(mut self, features: &str, label: Option<&str>) -> Result<FeatureSet> {
        let (matrix, names) = self
            .matrices
            .remove(features)
            .ok_or_else(|| TaxiFareError::ColumnNotFound(features.to_string()))?;

        let labels = match label {
            Some(name) => Some(numeric_column(&self.frame, name)?),
            None => None,
        };

        FeatureSet::new(matrix, labels, names)
    }
}

impl FittedTransform {
    /// Apply this transform to the state
    pub fn apply(&self, mut state: TransformState, mode: TransformMode) -> Result<TransformState> {
        match self {
            FittedTransform::CopyColumn { source, target } => {
                let present = state.frame.column(source).is_ok();
                if !present && mode == TransformMode::Unlabeled {
                    return Ok(state);
                }
                copy_column(&mut state.frame, source, target)?;
                Ok(state)
            }
            FittedTransform::OneHot(encoder) => {
                state.frame = encoder.transform(&state.frame)?;
                Ok(state)
            }
            FittedTransform::Concatenate { output, features } => {
                let matrix = concatenate(&state.frame, features)?;
                state.matrices.insert(output.clone(), (matrix, features.clone()));
                Ok(state)
            }
        }
    }
}

/// Replay fitted transforms over a frame, never refitting
pub fn apply_transforms(
    transforms: &[FittedTransform],
    frame: DataFrame,
    mode: TransformMode,
) -> Result<TransformState> {
    transforms
        .iter()
        .try_fold(TransformState::new(frame), |state, transform| {
            transform.apply(state, mode)
        })
}

/// Fold accumulator while fitting
struct FitState {
    data: TransformState,
    fitted: Vec<FittedTransform>,
    encoders: Vec<CategoricalEncoder>,
    regressor: Option<GradientBoostingRegressor>,
}

impl FitState {
    fn apply(mut self, step: &PipelineStep) -> Result<Self> {
        let start = Instant::now();
        match step {
            PipelineStep::CopyColumn { source, target } => {
                copy_column(&mut self.data.frame, source, target)?;
                self.fitted.push(FittedTransform::CopyColumn {
                    source: source.clone(),
                    target: target.clone(),
                });
            }
            PipelineStep::OneHotEncode {
                columns,
                handle_unknown,
            } => {
                let mut encoder = CategoricalEncoder::new(*handle_unknown);
                self.data.frame = encoder.fit_transform(&self.data.frame, columns)?;
                for column in encoder.columns() {
                    debug!(
                        column = %column,
                        categories = ?encoder.categories(column).unwrap_or_default(),
                        "Learned categories"
                    );
                }
                self.encoders.push(encoder.clone());
                self.fitted.push(FittedTransform::OneHot(encoder));
            }
            PipelineStep::Concatenate { output, columns } => {
                let features = self.expand_columns(columns)?;
                let transform = FittedTransform::Concatenate {
                    output: output.clone(),
                    features,
                };
                self.data = transform.apply(self.data, TransformMode::Labeled)?;
                self.fitted.push(transform);
            }
            PipelineStep::Train(config) => {
                // Train is always the last step, so the data can be consumed
                let data = std::mem::replace(
                    &mut self.data,
                    TransformState::new(DataFrame::empty()),
                );
                let feature_set =
                    data.into_feature_set(&config.feature_column, Some(&config.label_column))?;
                self.regressor = Some(Trainer::new(config.clone()).fit(&feature_set)?);
            }
        }
        debug!(
            step = step.kind(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Applied pipeline step"
        );
        Ok(self)
    }

    /// Resolve concatenation inputs, expanding one-hot encoded columns
    fn expand_columns(&self, columns: &[String]) -> Result<Vec<String>> {
        let mut features = Vec::new();
        for column in columns {
            let expanded = self
                .encoders
                .iter()
                .rev()
                .find_map(|encoder| encoder.output_columns(column));
            match expanded {
                Some(names) => features.extend(names),
                None => {
                    if self.data.frame.column(column).is_err() {
                        return Err(TaxiFareError::ColumnNotFound(column.clone()));
                    }
                    features.push(column.clone());
                }
            }
        }
        Ok(features)
    }
}

/// Declarative learning pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPipeline {
    steps: Vec<PipelineStep>,
}

impl Default for LearningPipeline {
    fn default() -> Self {
        Self::taxi_fare(HandleUnknown::default(), BoostingConfig::default())
    }
}

impl LearningPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// The standard taxi fare pipeline
    pub fn taxi_fare(handle_unknown: HandleUnknown, booster: BoostingConfig) -> Self {
        Self {
            steps: taxi_fare_steps(handle_unknown, booster),
        }
    }

    /// Append a step
    pub fn with_step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Check the step list and return the trainer configuration.
    ///
    /// There must be exactly one train step, it must come last, and its
    /// feature column must be produced by an earlier concatenation.
    pub fn validate(&self) -> Result<&BoostingConfig> {
        let train_steps = self
            .steps
            .iter()
            .filter(|s| matches!(s, PipelineStep::Train(_)))
            .count();
        let config = match self.steps.last() {
            Some(PipelineStep::Train(config)) if train_steps == 1 => config,
            _ => {
                return Err(TaxiFareError::Config(
                    "pipeline needs exactly one train step, placed last".to_string(),
                ))
            }
        };

        let has_features = self.steps.iter().any(|s| {
            matches!(s, PipelineStep::Concatenate { output, .. } if *output == config.feature_column)
        });
        if !has_features {
            return Err(TaxiFareError::Config(format!(
                "no concatenate step produces '{}'",
                config.feature_column
            )));
        }

        config.validate()?;
        Ok(config)
    }

    /// Fit every step in order over labeled records
    pub fn fit(&self, records: &[TripRecord]) -> Result<TrainedModel> {
        let config = self.validate()?;
        if records.is_empty() {
            return Err(TaxiFareError::Training("no training records".to_string()));
        }

        let start = Instant::now();
        let frame = records_to_frame(records)?;
        let input_columns: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let initial = FitState {
            data: TransformState::new(frame),
            fitted: Vec::new(),
            encoders: Vec::new(),
            regressor: None,
        };
        let state = self.steps.iter().try_fold(initial, |state, step| state.apply(step))?;
        let regressor = state.regressor.ok_or(TaxiFareError::ModelNotFitted)?;

        info!(
            rows = records.len(),
            steps = self.steps.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline fitted"
        );

        Ok(TrainedModel::new(
            state.fitted,
            regressor,
            config.clone(),
            input_columns,
            records.len(),
        ))
    }
}

fn copy_column(frame: &mut DataFrame, source: &str, target: &str) -> Result<()> {
    let column = frame
        .column(source)
        .map_err(|_| TaxiFareError::ColumnNotFound(source.to_string()))?
        .as_materialized_series()
        .clone()
        .with_name(target.into());
    frame.with_column(column)?;
    Ok(())
}

fn numeric_column(frame: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let column = frame
        .column(name)
        .map_err(|_| TaxiFareError::ColumnNotFound(name.to_string()))?
        .cast(&DataType::Float64)?;
    column
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                TaxiFareError::Schema(format!("row {}: missing value in '{}'", row, name))
            })
        })
        .collect()
}

fn concatenate(frame: &DataFrame, features: &[String]) -> Result<Array2<f64>> {
    let n_rows = frame.height();
    let mut matrix = Array2::<f64>::zeros((n_rows, features.len()));
    for (j, name) in features.iter().enumerate() {
        if frame.column(name).is_err() {
            return Err(TaxiFareError::DataMismatch(format!(
                "feature column '{}' is missing",
                name
            )));
        }
        let values = numeric_column(frame, name)?;
        matrix.column_mut(j).assign(&values);
    }
    Ok(matrix)
}
