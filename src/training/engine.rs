//! Training engine implementation

use super::config::BoostingConfig;
use super::gradient_boosting::GradientBoostingRegressor;
use crate::data::{features_frame, records_to_frame, TripRecord};
use crate::error::{Result, TaxiFareError};
use crate::export::ModelMetadata;
use crate::preprocessing::{
    apply_transforms, CategoricalEncoder, FeatureSet, FittedTransform, TransformMode,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Fits a boosted tree ensemble on an assembled feature set
#[derive(Debug, Clone)]
pub struct Trainer {
    config: BoostingConfig,
}

impl Trainer {
    pub fn new(config: BoostingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    /// Train on `data`, which must carry labels
    pub fn fit(&self, data: &FeatureSet) -> Result<GradientBoostingRegressor> {
        self.config.validate()?;
        let labels = data
            .labels()
            .ok_or_else(|| TaxiFareError::ColumnNotFound(self.config.label_column.clone()))?;

        let start = Instant::now();
        let regressor =
            GradientBoostingRegressor::fit(self.config.clone(), data.features(), labels)?;

        info!(
            rows = data.n_rows(),
            features = data.n_features(),
            trees = regressor.n_trees(),
            base_score = regressor.base_score(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trained boosted trees"
        );
        debug!(features = ?data.feature_names(), "Booster input columns");

        Ok(regressor)
    }
}

/// Fitted pipeline: replayable transforms plus the tree ensemble
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    metadata: ModelMetadata,
    input_columns: Vec<String>,
    transforms: Vec<FittedTransform>,
    regressor: GradientBoostingRegressor,
}

impl TrainedModel {
    pub(crate) fn new(
        transforms: Vec<FittedTransform>,
        regressor: GradientBoostingRegressor,
        config: BoostingConfig,
        input_columns: Vec<String>,
        n_rows: usize,
    ) -> Self {
        let feature_names = concatenated_features(&transforms, &config.feature_column)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        let target = transforms
            .iter()
            .find_map(|t| match t {
                FittedTransform::CopyColumn { source, target } if *target == config.label_column => {
                    Some(source.clone())
                }
                _ => None,
            })
            .unwrap_or_else(|| config.label_column.clone());

        let metadata = ModelMetadata::new("taxi-fare")
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_model_type("gradient_boosted_trees")
            .with_features(feature_names)
            .with_target(target)
            .with_training_rows(n_rows)
            .add_hyperparameter("num_trees", config.num_trees.to_string())
            .add_hyperparameter("max_depth", config.max_depth.to_string())
            .add_hyperparameter("num_leaves", config.num_leaves.to_string())
            .add_hyperparameter("min_samples_leaf", config.min_samples_leaf.to_string())
            .add_hyperparameter("learning_rate", config.learning_rate.to_string())
            .add_hyperparameter("max_bins", config.max_bins.to_string())
            .add_hyperparameter("reg_lambda", config.reg_lambda.to_string())
            .add_hyperparameter("seed", config.seed.to_string());

        Self {
            metadata,
            input_columns,
            transforms,
            regressor,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Raw input columns seen at training time
    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    pub fn transforms(&self) -> &[FittedTransform] {
        &self.transforms
    }

    pub fn regressor(&self) -> &GradientBoostingRegressor {
        &self.regressor
    }

    pub fn config(&self) -> &BoostingConfig {
        self.regressor.config()
    }

    /// Model input columns in matrix order
    pub fn feature_names(&self) -> &[String] {
        concatenated_features(&self.transforms, &self.config().feature_column).unwrap_or(&[])
    }

    /// Fitted category mappings, in pipeline order
    pub fn encoders(&self) -> impl Iterator<Item = &CategoricalEncoder> {
        self.transforms.iter().filter_map(|t| match t {
            FittedTransform::OneHot(encoder) => Some(encoder),
            _ => None,
        })
    }

    /// Run the fitted transforms over records
    pub fn featurize(&self, records: &[TripRecord], mode: TransformMode) -> Result<FeatureSet> {
        let frame = match mode {
            TransformMode::Labeled => records_to_frame(records)?,
            TransformMode::Unlabeled => features_frame(records)?,
        };
        let state = apply_transforms(&self.transforms, frame, mode)?;
        let label = match mode {
            TransformMode::Labeled => Some(self.config().label_column.as_str()),
            TransformMode::Unlabeled => None,
        };
        state.into_feature_set(&self.config().feature_column, label)
    }

    /// Score every row of a feature set
    pub fn score(&self, features: &FeatureSet) -> Result<Array1<f64>> {
        self.regressor.predict(features.features())
    }
}

fn concatenated_features<'a>(transforms: &'a [FittedTransform], output_name: &str) -> Option<&'a [String]> {
    transforms.iter().rev().find_map(|t| match t {
        FittedTransform::Concatenate { output, features } if output == output_name => {
            Some(features.as_slice())
        }
        _ => None,
    })
}
