//! Regression evaluation metrics

use crate::error::{Result, TaxiFareError};
use linfa::prelude::SingleTargetRegression;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics for a regression model on one dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Root mean squared error
    pub rms: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Mean absolute error (L1)
    pub mae: f64,
    /// Mean squared error (L2)
    pub mse: f64,
    /// Number of evaluated rows
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compare predictions against true labels.
    ///
    /// R² is reported as 0 when the labels have no variance.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(TaxiFareError::DataMismatch(format!(
                "{} labels for {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(TaxiFareError::DataMismatch(
                "no rows to evaluate".to_string(),
            ));
        }

        let mse = y_pred.mean_squared_error(y_true).map_err(metric_error)?;
        let mae = y_pred.mean_absolute_error(y_true).map_err(metric_error)?;
        let r_squared = if y_true.var(0.0) > 0.0 {
            y_pred.r2(y_true).map_err(metric_error)?
        } else {
            0.0
        };

        Ok(Self {
            rms: mse.sqrt(),
            r_squared,
            mae,
            mse,
            n_samples: y_true.len(),
        })
    }
}

fn metric_error(err: linfa::Error) -> TaxiFareError {
    TaxiFareError::DataMismatch(err.to_string())
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rms = {}", self.rms)?;
        write!(f, "RSquared = {}", self.r_squared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        let metrics = RegressionMetrics::compute(&y, &y).unwrap();
        assert_eq!(metrics.rms, 0.0);
        assert_eq!(metrics.mae, 0.0);
        assert!((metrics.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(metrics.n_samples, 4);
    }

    #[test]
    fn test_known_errors() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.0, 2.0, 3.0, 2.0];
        let metrics = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        // residuals: -1, 0, 0, 2
        assert!((metrics.mse - 1.25).abs() < 1e-12);
        assert!((metrics.rms - 1.25f64.sqrt()).abs() < 1e-12);
        assert!((metrics.mae - 0.75).abs() < 1e-12);
        // ss_res = ss_tot = 5.0
        assert!(metrics.r_squared.abs() < 1e-9);
    }

    #[test]
    fn test_constant_labels_give_zero_r_squared() {
        let y_true = array![5.0, 5.0, 5.0];
        let y_pred = array![4.0, 5.0, 6.0];
        let metrics = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        assert_eq!(metrics.r_squared, 0.0);
    }

    #[test]
    fn test_empty_and_mismatched_inputs() {
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(
            RegressionMetrics::compute(&empty, &empty),
            Err(TaxiFareError::DataMismatch(_))
        ));
        assert!(matches!(
            RegressionMetrics::compute(&array![1.0], &array![1.0, 2.0]),
            Err(TaxiFareError::DataMismatch(_))
        ));
    }

    #[test]
    fn test_display_lines() {
        let metrics = RegressionMetrics {
            rms: 2.5,
            r_squared: 0.75,
            mae: 1.0,
            mse: 6.25,
            n_samples: 3,
        };
        assert_eq!(metrics.to_string(), "Rms = 2.5\nRSquared = 0.75");
    }
}
