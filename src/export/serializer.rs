//! Model serialization utilities
//!
//! Models are written as a bincode envelope: magic bytes, format version,
//! metadata, the bincode-encoded model and an FNV-1a checksum over it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Result, TrainError};

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model type
    pub model_type: String,
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
    /// Number of input features
    pub n_features: usize,
    /// Hyperparameters the model was fitted with
    pub hyperparameters: BTreeMap<String, String>,
    /// Evaluation metrics
    pub metrics: BTreeMap<String, f64>,
}

impl ModelMetadata {
    /// Create new metadata stamped with the current time
    pub fn new(model_type: impl Into<String>) -> Self {
        Self {
            model_type: model_type.into(),
            trained_at: Utc::now().to_rfc3339(),
            n_features: 0,
            hyperparameters: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Set feature count
    pub fn with_n_features(mut self, n: usize) -> Self {
        self.n_features = n;
        self
    }

    /// Add hyperparameter
    pub fn add_hyperparameter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.hyperparameters.insert(key.into(), value.to_string());
        self
    }

    /// Add metric
    pub fn add_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// Serializable model wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedModel {
    magic: [u8; 4],
    format_version: u32,
    metadata: ModelMetadata,
    model_data: Vec<u8>,
    checksum: u64,
}

impl SerializedModel {
    const MAGIC: [u8; 4] = [b'B', b'F', b'I', b'T'];
    const VERSION: u32 = 1;

    fn new(metadata: ModelMetadata, model_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&model_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            model_data,
            checksum,
        }
    }

    /// FNV-1a over the encoded model
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

    fn verify(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(TrainError::SerializationError(
                "Not a model file: bad magic bytes".to_string(),
            ));
        }
        if self.format_version != Self::VERSION {
            return Err(TrainError::SerializationError(format!(
                "Unsupported model format version {}",
                self.format_version
            )));
        }
        if Self::compute_checksum(&self.model_data) != self.checksum {
            return Err(TrainError::SerializationError(
                "Checksum verification failed - file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Save a serializable model to file, creating parent directories
pub fn save_model<M: Serialize>(model: &M, path: impl AsRef<Path>, metadata: ModelMetadata) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let model_data = bincode::serialize(model)
        .map_err(|e| TrainError::SerializationError(format!("Failed to serialize: {}", e)))?;
    let serialized = SerializedModel::new(metadata, model_data);

    let file = File::create(path)
        .map_err(|e| TrainError::DataError(format!("Failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);

    bincode::serialize_into(&mut writer, &serialized)
        .map_err(|e| TrainError::SerializationError(format!("Failed to write: {}", e)))?;
    writer.flush()?;

    Ok(())
}

/// Load a model from file
pub fn load_model<M: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<(M, ModelMetadata)> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| TrainError::DataError(format!("Failed to open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);

    let serialized: SerializedModel = bincode::deserialize_from(reader)
        .map_err(|e| TrainError::SerializationError(format!("Failed to deserialize: {}", e)))?;
    serialized.verify()?;

    let model: M = bincode::deserialize(&serialized.model_data)
        .map_err(|e| TrainError::SerializationError(format!("Failed to deserialize: {}", e)))?;

    Ok((model, serialized.metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{GradientBoostingConfig, GradientBoostingRegressor};
    use ndarray::{Array1, Array2};

    #[test]
    fn test_save_and_load_regressor() {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| (i + j) as f64);
        let y: Array1<f64> = (0..30).map(|i| i as f64 * 1.5).collect();
        let mut model = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_n_estimators(5));
        model.fit(&x, &y).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("optimized.pkl");
        let metadata = ModelMetadata::new("gradient_boosting_regressor")
            .with_n_features(2)
            .add_hyperparameter("n_estimators", 5)
            .add_metric("r2", 0.9);

        save_model(&model, &path, metadata.clone()).unwrap();
        let (loaded, loaded_meta): (GradientBoostingRegressor, ModelMetadata) = load_model(&path).unwrap();

        assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
        assert_eq!(loaded_meta, metadata);
    }

    #[test]
    fn test_corrupted_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.bin");
        save_model(&vec![1.0f64, 2.0, 3.0], &path, ModelMetadata::new("vec")).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 9;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        assert!(load_model::<Vec<f64>>(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_model::<Vec<f64>>(dir.path().join("absent")).is_err());
    }
}
