//! Model training module
//!
//! Gradient boosted regression trees for squared-error regression:
//! - Booster hyperparameters and their validation
//! - `forust-ml` training behind a serializable regressor
//! - Regression metrics (RMS, R², L1, L2)

mod config;
mod engine;
mod metrics;
pub mod gradient_boosting;

pub use config::BoostingConfig;
pub use engine::{TrainedModel, Trainer};
pub use gradient_boosting::GradientBoostingRegressor;
pub use metrics::RegressionMetrics;
