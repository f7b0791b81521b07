//! Trainer configuration

use crate::error::{Result, TaxiFareError};
use crate::preprocessing::{FEATURES_COLUMN, LABEL_COLUMN};
use serde::{Deserialize, Serialize};

/// Hyperparameters of the boosted regression tree trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Number of boosting rounds (trees)
    pub num_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Maximum leaves per tree
    pub num_leaves: usize,
    /// Minimum training rows in a leaf
    pub min_samples_leaf: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Histogram bins per feature
    pub max_bins: usize,
    /// L2 regularization of leaf values
    pub reg_lambda: f64,
    /// Label input column
    pub label_column: String,
    /// Feature input column
    pub feature_column: String,
    /// Seed handed to the booster
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 5,
            num_leaves: 20,
            min_samples_leaf: 10,
            learning_rate: 0.2,
            max_bins: 256,
            reg_lambda: 1.0,
            label_column: LABEL_COLUMN.to_string(),
            feature_column: FEATURES_COLUMN.to_string(),
            seed: 42,
        }
    }
}

impl BoostingConfig {
    pub fn with_num_trees(mut self, num_trees: usize) -> Self {
        self.num_trees = num_trees;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_num_leaves(mut self, num_leaves: usize) -> Self {
        self.num_leaves = num_leaves;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject options the trainer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.num_trees == 0 {
            return Err(TaxiFareError::invalid_parameter(
                "num_trees",
                self.num_trees,
                "must be at least 1",
            ));
        }
        if self.max_depth == 0 {
            return Err(TaxiFareError::invalid_parameter(
                "max_depth",
                self.max_depth,
                "must be at least 1",
            ));
        }
        if self.num_leaves < 2 {
            return Err(TaxiFareError::invalid_parameter(
                "num_leaves",
                self.num_leaves,
                "must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(TaxiFareError::invalid_parameter(
                "min_samples_leaf",
                self.min_samples_leaf,
                "must be at least 1",
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(TaxiFareError::invalid_parameter(
                "learning_rate",
                self.learning_rate,
                "must be positive",
            ));
        }
        if !(2..=256).contains(&self.max_bins) {
            return Err(TaxiFareError::invalid_parameter(
                "max_bins",
                self.max_bins,
                "must be between 2 and 256",
            ));
        }
        if !(self.reg_lambda >= 0.0 && self.reg_lambda.is_finite()) {
            return Err(TaxiFareError::invalid_parameter(
                "reg_lambda",
                self.reg_lambda,
                "must not be negative",
            ));
        }
        Ok(())
    }
}
