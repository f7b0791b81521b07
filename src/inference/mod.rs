//! Inference module
//!
//! Reuses a fitted [`TrainedModel`](crate::training::TrainedModel) for:
//! - Aggregate evaluation over a labeled file ([`Evaluator`])
//! - Single and batch fare prediction ([`Predictor`])

mod engine;

pub use engine::{Evaluator, Predictor};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted fare for one trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FarePrediction {
    pub fare_amount: f64,
}

impl fmt::Display for FarePrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fare_amount)
    }
}
