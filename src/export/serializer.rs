//! Model serialization utilities
//!
//! Trained models are written as a bincode envelope: magic bytes, format
//! version, metadata, the bincode model payload and an FNV-1a checksum of
//! that payload.

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::{Result, TaxiFareError};

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,
    /// Model version
    pub version: String,
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
    /// Feature names in matrix order
    pub feature_names: Vec<String>,
    /// Target name
    pub target_name: String,
    /// Model type
    pub model_type: String,
    /// Number of training rows
    pub training_rows: usize,
    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            version: "1.0.0".to_string(),
            trained_at: Utc::now().to_rfc3339(),
            feature_names: Vec::new(),
            target_name: "target".to_string(),
            model_type: "unknown".to_string(),
            training_rows: 0,
            hyperparameters: BTreeMap::new(),
        }
    }
}

impl ModelMetadata {
    /// Create new metadata with name, stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = model_type.into();
        self
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.feature_names = features;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_name = target.into();
        self
    }

    pub fn with_training_rows(mut self, rows: usize) -> Self {
        self.training_rows = rows;
        self
    }

    /// Add hyperparameter
    pub fn add_hyperparameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hyperparameters.insert(key.into(), value.into());
        self
    }
}

/// On-disk model envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedModel {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    /// Model metadata
    pub metadata: ModelMetadata,
    /// Serialized model data
    pub model_data: Vec<u8>,
    /// Checksum for integrity verification
    pub checksum: u64,
}

impl SerializedModel {
    /// Magic bytes for taxi fare model files
    pub const MAGIC: [u8; 4] = *b"TFPM";
    /// Current format version
    pub const VERSION: u32 = 1;

    /// Wrap an already serialized payload
    pub fn new(metadata: ModelMetadata, model_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&model_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            model_data,
            checksum,
        }
    }

    /// Compute checksum using FNV-1a hash
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        let mut hash = FNV_OFFSET;
        for byte in data {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    /// Verify checksum
    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.model_data) == self.checksum
    }

    /// Check magic, version and checksum
    pub fn verify(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(TaxiFareError::Serialization(
                "not a taxi fare model file".to_string(),
            ));
        }
        if self.format_version != Self::VERSION {
            return Err(TaxiFareError::Serialization(format!(
                "unsupported model format version {}",
                self.format_version
            )));
        }
        if !self.verify_checksum() {
            return Err(TaxiFareError::Serialization(
                "checksum verification failed, file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Models that can be written in the envelope format
pub trait ModelSerializer: Serialize + DeserializeOwned + Sized {
    /// Metadata stored alongside the payload
    fn metadata(&self) -> ModelMetadata;

    /// Encode the full envelope
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let model_data = bincode::serialize(self)?;
        let envelope = SerializedModel::new(self.metadata(), model_data);
        Ok(bincode::serialize(&envelope)?)
    }

    /// Decode and verify an envelope
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: SerializedModel = bincode::deserialize(bytes)?;
        envelope.verify()?;
        Ok(bincode::deserialize(&envelope.model_data)?)
    }

    /// Save to file, blocking
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes).map_err(|e| TaxiFareError::file_access(path, e))?;
        info!(path = %path.display(), bytes = bytes.len(), "Model saved");
        Ok(())
    }

    /// Save to file through tokio's file I/O
    fn save_async(&self, path: impl AsRef<Path>) -> impl std::future::Future<Output = Result<()>> + Send {
        let path = path.as_ref().to_path_buf();
        let bytes = self.to_bytes();
        async move {
            let bytes = bytes?;
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| TaxiFareError::file_access(&path, e))?;
            info!(path = %path.display(), bytes = bytes.len(), "Model saved");
            Ok(())
        }
    }

    /// Load from file
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| TaxiFareError::file_access(path, e))?;
        let model = Self::from_bytes(&bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Model loaded");
        Ok(model)
    }
}

/// Read only the metadata of a saved model
pub fn read_metadata(path: impl AsRef<Path>) -> Result<ModelMetadata> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| TaxiFareError::file_access(path, e))?;
    let envelope: SerializedModel = bincode::deserialize(&bytes)?;
    envelope.verify()?;
    Ok(envelope.metadata)
}
