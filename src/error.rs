//! Error types for the taxi fare pipeline

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, TaxiFareError>;

/// Main error type for loading, training, evaluation and persistence
#[derive(Error, Debug)]
pub enum TaxiFareError {
    #[error("Cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Data mismatch: {0}")]
    DataMismatch(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl TaxiFareError {
    /// Wrap an I/O failure together with the path that caused it
    pub fn file_access(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        TaxiFareError::FileAccess {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        TaxiFareError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for TaxiFareError {
    fn from(err: polars::error::PolarsError) -> Self {
        match err {
            polars::error::PolarsError::ColumnNotFound(name) => {
                TaxiFareError::ColumnNotFound(name.to_string())
            }
            other => TaxiFareError::Schema(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for TaxiFareError {
    fn from(err: serde_json::Error) -> Self {
        TaxiFareError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for TaxiFareError {
    fn from(err: bincode::Error) -> Self {
        TaxiFareError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TaxiFareError::ColumnNotFound("fare_amount".to_string());
        assert_eq!(err.to_string(), "Column not found: fare_amount");
    }

    #[test]
    fn test_file_access_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = TaxiFareError::file_access("Data/missing.csv", io_err);
        assert!(matches!(err, TaxiFareError::FileAccess { .. }));
        assert!(err.to_string().contains("Data/missing.csv"));
    }

    #[test]
    fn test_polars_column_not_found_maps() {
        let err: TaxiFareError =
            polars::error::PolarsError::ColumnNotFound("Label".into()).into();
        assert!(matches!(err, TaxiFareError::ColumnNotFound(_)));
    }
}
