//! Hyperparameter file loader
//!
//! The platform writes every hyperparameter as a JSON string, so `"300"` and
//! `300` are both accepted. Only `seconds` is recognized.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Result, TrainError};

/// Search budget used when `seconds` is absent or null
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Options read from `hyperparameters.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hyperparameters {
    /// Wall-clock budget for the hyperparameter search
    pub seconds: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Hyperparameters {
    /// Read and interpret the hyperparameter file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TrainError::ConfigError(format!("Cannot read hyperparameters file {}: {}", path.display(), e))
        })?;

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            TrainError::ConfigError(format!("Invalid JSON in {}: {}", path.display(), e))
        })?;

        let hyperparameters = Self::from_value(&value)?;
        info!(seconds = hyperparameters.seconds, "Loaded hyperparameters");
        Ok(hyperparameters)
    }

    /// Interpret an already parsed JSON document
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            TrainError::ConfigError("Hyperparameters must be a JSON object".to_string())
        })?;

        for key in map.keys().filter(|k| k.as_str() != "seconds") {
            warn!(key = %key, "Ignoring unrecognized hyperparameter");
        }

        let seconds = match map.get("seconds") {
            None | Some(Value::Null) => DEFAULT_TIMEOUT_SECS,
            Some(v) => parse_seconds(v)?,
        };

        Ok(Self { seconds })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

fn parse_seconds(value: &Value) -> Result<u64> {
    let invalid = || {
        TrainError::ConfigError(format!(
            "Hyperparameter `seconds` must be a non-negative integer, got {}",
            value
        ))
    };

    match value {
        Value::Number(n) => match n.as_u64() {
            Some(v) => Ok(v),
            None => match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
                _ => Err(invalid()),
            },
        },
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_seconds() {
        let hp = Hyperparameters::from_value(&json!({"seconds": 5})).unwrap();
        assert_eq!(hp.seconds, 5);
        assert_eq!(hp.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_string_seconds() {
        let hp = Hyperparameters::from_value(&json!({"seconds": "120"})).unwrap();
        assert_eq!(hp.seconds, 120);
    }

    #[test]
    fn test_integral_float_seconds() {
        let hp = Hyperparameters::from_value(&json!({"seconds": 30.0})).unwrap();
        assert_eq!(hp.seconds, 30);
    }

    #[test]
    fn test_missing_or_null_defaults() {
        assert_eq!(Hyperparameters::from_value(&json!({})).unwrap().seconds, 300);
        assert_eq!(Hyperparameters::from_value(&json!({"seconds": null})).unwrap().seconds, 300);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let hp = Hyperparameters::from_value(&json!({"seconds": "7", "depth": "3"})).unwrap();
        assert_eq!(hp.seconds, 7);
    }

    #[test]
    fn test_malformed_seconds_fail_fast() {
        for bad in [json!({"seconds": "abc"}), json!({"seconds": -1}), json!({"seconds": 1.5}), json!({"seconds": true})] {
            let err = Hyperparameters::from_value(&bad).unwrap_err();
            assert!(matches!(err, TrainError::ConfigError(_)), "{:?}", bad);
        }
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            Hyperparameters::from_value(&json!([1, 2])),
            Err(TrainError::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyperparameters.json");
        std::fs::write(&path, r#"{"seconds": "9"}"#).unwrap();

        assert_eq!(Hyperparameters::load(&path).unwrap().seconds, 9);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Hyperparameters::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TrainError::ConfigError(_)));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyperparameters.json");
        std::fs::write(&path, "{seconds: 5").unwrap();

        assert!(matches!(Hyperparameters::load(&path), Err(TrainError::ConfigError(_))));
    }
}
