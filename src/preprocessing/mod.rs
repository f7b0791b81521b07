//! Feature pipeline
//!
//! Turns trip records into a fixed-width numeric feature matrix:
//! - Label aliasing (copy the fare into the `Label` column)
//! - Categorical one-hot encoding with a fitted category mapping
//! - Feature concatenation in a documented column order
//!
//! Steps are plain tagged values ([`PipelineStep`]) folded in order. Fitting
//! produces [`FittedTransform`]s which are replayed, never refitted, on
//! evaluation and prediction data.

mod config;
mod encoder;
mod pipeline;

pub use config::{taxi_fare_steps, HandleUnknown, PipelineStep, FEATURES_COLUMN, LABEL_COLUMN};
pub use encoder::CategoricalEncoder;
pub use pipeline::{apply_transforms, FittedTransform, LearningPipeline, TransformMode, TransformState};

use crate::error::{Result, TaxiFareError};
use ndarray::{Array1, Array2};

/// One model input row with its optional label
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    pub label: Option<f64>,
}

/// Feature matrix with ordered column names and optional labels
#[derive(Debug, Clone)]
pub struct FeatureSet {
    features: Array2<f64>,
    labels: Option<Array1<f64>>,
    feature_names: Vec<String>,
}

impl FeatureSet {
    /// Create a feature set, checking that shapes agree
    pub fn new(
        features: Array2<f64>,
        labels: Option<Array1<f64>>,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if feature_names.len() != features.ncols() {
            return Err(TaxiFareError::DataMismatch(format!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                features.ncols()
            )));
        }
        if let Some(labels) = &labels {
            if labels.len() != features.nrows() {
                return Err(TaxiFareError::DataMismatch(format!(
                    "{} labels for {} rows",
                    labels.len(),
                    features.nrows()
                )));
            }
        }
        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> Option<&Array1<f64>> {
        self.labels.as_ref()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Row `i` as a feature vector
    pub fn row(&self, i: usize) -> FeatureVector {
        FeatureVector {
            values: self.features.row(i).to_vec(),
            label: self.labels.as_ref().map(|l| l[i]),
        }
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = FeatureVector> + '_ {
        (0..self.n_rows()).map(move |i| self.row(i))
    }
}
