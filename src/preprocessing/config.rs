//! Pipeline step configuration

use crate::data::columns;
use crate::training::BoostingConfig;
use serde::{Deserialize, Serialize};

/// Name of the canonical label column
pub const LABEL_COLUMN: &str = "Label";
/// Name of the concatenated feature column
pub const FEATURES_COLUMN: &str = "Features";

/// Policy for categories that were not seen while fitting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Encode as an all-zero indicator vector
    #[default]
    Ignore,
    /// Fail with a data mismatch error
    Error,
}

/// One declarative stage of a learning pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineStep {
    /// Copy a column under a new name (label aliasing)
    CopyColumn { source: String, target: String },
    /// One-hot encode categorical columns
    OneHotEncode {
        columns: Vec<String>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    /// Concatenate columns, in order, into one feature matrix
    Concatenate { output: String, columns: Vec<String> },
    /// Fit the boosted tree regressor
    Train(BoostingConfig),
}

impl PipelineStep {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineStep::CopyColumn { .. } => "copy_column",
            PipelineStep::OneHotEncode { .. } => "one_hot_encode",
            PipelineStep::Concatenate { .. } => "concatenate",
            PipelineStep::Train(_) => "train",
        }
    }

    pub fn copy_column(source: impl Into<String>, target: impl Into<String>) -> Self {
        PipelineStep::CopyColumn {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn one_hot<S: AsRef<str>>(columns: &[S], handle_unknown: HandleUnknown) -> Self {
        PipelineStep::OneHotEncode {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            handle_unknown,
        }
    }

    pub fn concatenate<S: AsRef<str>>(output: impl Into<String>, columns: &[S]) -> Self {
        PipelineStep::Concatenate {
            output: output.into(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }
}

/// The taxi fare pipeline: alias the fare as the label, one-hot the three
/// categorical columns, concatenate everything into `Features`, train.
///
/// Feature order is vendor id indicators, rate code indicators, passenger
/// count, trip distance, payment type indicators.
pub fn taxi_fare_steps(handle_unknown: HandleUnknown, booster: BoostingConfig) -> Vec<PipelineStep> {
    vec![
        PipelineStep::copy_column(columns::FARE_AMOUNT, LABEL_COLUMN),
        PipelineStep::one_hot(
            &[columns::VENDOR_ID, columns::RATE_CODE, columns::PAYMENT_TYPE],
            handle_unknown,
        ),
        PipelineStep::concatenate(FEATURES_COLUMN, &columns::FEATURES),
        PipelineStep::Train(booster),
    ]
}
