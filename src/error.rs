//! Error types for the training pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, TrainError>;

/// Every failure the pipeline can raise. All of them are fatal to a run.
#[derive(Error, Debug)]
pub enum TrainError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Optimization error: {0}")]
    OptimizationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl From<polars::error::PolarsError> for TrainError {
    fn from(err: polars::error::PolarsError) -> Self {
        TrainError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TrainError {
    fn from(err: serde_json::Error) -> Self {
        TrainError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for TrainError {
    fn from(err: bincode::Error) -> Self {
        TrainError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TrainError {
    fn from(err: ndarray::ShapeError) -> Self {
        TrainError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrainError::ValidationError("no rows".to_string());
        assert_eq!(err.to_string(), "Validation error: no rows");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TrainError = io_err.into();
        assert!(matches!(err, TrainError::IoError(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: TrainError = json_err.into();
        assert!(matches!(err, TrainError::SerializationError(_)));
    }
}
