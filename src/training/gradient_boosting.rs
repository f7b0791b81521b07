//! Gradient Boosting implementation
//!
//! Squared-error boosted regression trees fitted by `forust-ml`. The
//! booster is persisted in its own JSON form, nested inside the model
//! envelope.

use forust_ml::objective::ObjectiveType;
use forust_ml::{GradientBooster, Matrix};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::BoostingConfig;
use crate::error::{Result, TaxiFareError};

/// Gradient Boosting Regressor
#[derive(Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: BoostingConfig,
    n_features: usize,
    base_score: f64,
    #[serde(with = "booster_json")]
    booster: GradientBooster,
}

impl GradientBoostingRegressor {
    /// Fit a booster on a row-major feature matrix
    pub fn fit(config: BoostingConfig, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        config.validate()?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples == 0 {
            return Err(TaxiFareError::Training("no training rows".to_string()));
        }
        if n_features == 0 {
            return Err(TaxiFareError::Training("no feature columns".to_string()));
        }
        if y.len() != n_samples {
            return Err(TaxiFareError::DataMismatch(format!(
                "{} labels for {} rows",
                y.len(),
                n_samples
            )));
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(TaxiFareError::Training(format!(
                "label in row {} is not finite",
                row
            )));
        }

        let base_score = y.mean().unwrap_or(0.0);
        let data = column_major(x);
        let matrix = Matrix::new(&data, n_samples, n_features);
        let targets = y.to_vec();

        let mut booster = GradientBooster::default()
            .set_objective_type(ObjectiveType::SquaredLoss)
            .set_iterations(config.num_trees)
            .set_learning_rate(config.learning_rate as f32)
            .set_max_depth(config.max_depth)
            .set_max_leaves(config.num_leaves)
            .set_min_leaf_weight(config.min_samples_leaf as f32)
            .set_l2(config.reg_lambda as f32)
            .set_nbins(config.max_bins as u16)
            .set_base_score(base_score)
            .set_seed(config.seed)
            .set_parallel(true);

        booster
            .fit_unweighted(&matrix, &targets, None)
            .map_err(|e| TaxiFareError::Training(e.to_string()))?;

        Ok(Self {
            config,
            n_features,
            base_score,
            booster,
        })
    }

    /// Predict every row of `x`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(TaxiFareError::DataMismatch(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        if x.nrows() == 0 {
            return Ok(Array1::zeros(0));
        }

        let data = column_major(x);
        let matrix = Matrix::new(&data, x.nrows(), x.ncols());
        Ok(Array1::from(self.booster.predict(&matrix, true)))
    }

    /// Predict a single feature row
    pub fn predict_one(&self, row: &[f64]) -> Result<f64> {
        let x = Array2::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| TaxiFareError::DataMismatch(e.to_string()))?;
        Ok(self.predict(&x)?[0])
    }

    /// Boosting rounds run
    pub fn n_trees(&self) -> usize {
        self.config.num_trees
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean training label the ensemble starts from
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn booster(&self) -> &GradientBooster {
        &self.booster
    }
}

impl fmt::Debug for GradientBoostingRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientBoostingRegressor")
            .field("config", &self.config)
            .field("n_features", &self.n_features)
            .field("base_score", &self.base_score)
            .finish_non_exhaustive()
    }
}

/// `forust-ml` reads matrices column by column
fn column_major(x: &Array2<f64>) -> Vec<f64> {
    x.t().iter().copied().collect()
}

mod booster_json {
    use forust_ml::GradientBooster;
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        booster: &GradientBooster,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let json = booster.json_dump().map_err(S::Error::custom)?;
        serializer.serialize_str(&json)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<GradientBooster, D::Error> {
        let json = String::deserialize(deserializer)?;
        GradientBooster::from_json(&json).map_err(D::Error::custom)
    }
}
