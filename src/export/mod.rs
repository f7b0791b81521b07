//! Model export and serialization module
//!
//! Persists a [`TrainedModel`] (fitted transforms plus tree ensemble) in a
//! checksummed bincode envelope, with blocking and async writers.

mod serializer;

pub use serializer::{read_metadata, ModelMetadata, ModelSerializer, SerializedModel};

use crate::training::TrainedModel;

impl ModelSerializer for TrainedModel {
    fn metadata(&self) -> ModelMetadata {
        TrainedModel::metadata(self).clone()
    }
}
