//! Taxi fare prediction
//!
//! Trains a gradient boosted regression tree model on historical taxi trips
//! and predicts the fare of new trips.
//!
//! # Modules
//!
//! - [`data`] - Trip records and the delimited-file loader
//! - [`preprocessing`] - Label aliasing, one-hot encoding, feature concatenation
//! - [`training`] - Boosted regression trees and regression metrics
//! - [`inference`] - Evaluation over a labeled file and fare prediction
//! - [`export`] - Checksummed model persistence
//! - [`config`] - Application configuration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Pipeline stages
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod inference;

// Persistence and configuration
pub mod export;
pub mod config;

// Services
pub mod cli;

pub use error::{Result, TaxiFareError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, TaxiFareError};

    pub use crate::data::{DataLoader, LoaderOptions, TripRecord};

    pub use crate::preprocessing::{
        FeatureSet, HandleUnknown, LearningPipeline, PipelineStep, TransformMode,
    };

    pub use crate::training::{BoostingConfig, RegressionMetrics, TrainedModel};

    pub use crate::inference::{Evaluator, FarePrediction, Predictor};

    pub use crate::export::{ModelMetadata, ModelSerializer};

    pub use crate::config::AppConfig;
}
