//! Application configuration
//!
//! Built-in defaults reproduce the fixed `Data/` layout. A JSON file can
//! override any field, and command-line flags override the file.

use crate::data::LoaderOptions;
use crate::error::{Result, TaxiFareError};
use crate::preprocessing::{HandleUnknown, LearningPipeline};
use crate::training::BoostingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "Data";
pub const DEFAULT_TRAIN_FILE: &str = "taxi-fare-train.csv";
pub const DEFAULT_TEST_FILE: &str = "taxi-fare-test.csv";
pub const DEFAULT_MODEL_FILE: &str = "Model.bin";

/// Paths, input layout and trainer settings for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory that relative file names are resolved against
    pub data_dir: PathBuf,
    pub train_file: PathBuf,
    pub test_file: PathBuf,
    pub model_file: PathBuf,
    pub loader: LoaderOptions,
    /// What one-hot encoding does with categories unseen in training
    pub handle_unknown: HandleUnknown,
    pub booster: BoostingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            train_file: PathBuf::from(DEFAULT_TRAIN_FILE),
            test_file: PathBuf::from(DEFAULT_TEST_FILE),
            model_file: PathBuf::from(DEFAULT_MODEL_FILE),
            loader: LoaderOptions::default(),
            handle_unknown: HandleUnknown::default(),
            booster: BoostingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TaxiFareError::file_access(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| TaxiFareError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_train_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.train_file = file.into();
        self
    }

    pub fn with_test_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.test_file = file.into();
        self
    }

    pub fn with_model_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.model_file = file.into();
        self
    }

    pub fn with_handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }

    pub fn with_booster(mut self, booster: BoostingConfig) -> Self {
        self.booster = booster;
        self
    }

    pub fn train_path(&self) -> PathBuf {
        self.data_dir.join(&self.train_file)
    }

    pub fn test_path(&self) -> PathBuf {
        self.data_dir.join(&self.test_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.data_dir.join(&self.model_file)
    }

    /// The taxi fare pipeline with this config's encoding policy and booster
    pub fn pipeline(&self) -> LearningPipeline {
        LearningPipeline::taxi_fare(self.handle_unknown, self.booster.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.train_file.as_os_str().is_empty()
            || self.test_file.as_os_str().is_empty()
            || self.model_file.as_os_str().is_empty()
        {
            return Err(TaxiFareError::Config("file names must not be empty".to_string()));
        }
        self.booster.validate()
    }
}
