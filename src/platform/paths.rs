//! Fixed directory layout of the training container

use std::path::{Path, PathBuf};

/// Root the platform mounts everything under
pub const DEFAULT_PREFIX: &str = "/opt/ml";

/// Name of the channel holding the training data
pub const TRAINING_CHANNEL: &str = "training";

/// Every path the entry point reads or writes, derived from one root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPaths {
    prefix: PathBuf,
}

impl Default for PlatformPaths {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl PlatformPaths {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// `input/config/hyperparameters.json`
    pub fn hyperparameters(&self) -> PathBuf {
        self.prefix.join("input").join("config").join("hyperparameters.json")
    }

    /// `input/data/<channel>`
    pub fn channel(&self, name: &str) -> PathBuf {
        self.prefix.join("input").join("data").join(name)
    }

    pub fn training_dir(&self) -> PathBuf {
        self.channel(TRAINING_CHANNEL)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.prefix.join("output")
    }

    /// `output/optimization.csv`
    pub fn trace(&self) -> PathBuf {
        self.output_dir().join("optimization.csv")
    }

    /// `output/failure`
    pub fn failure(&self) -> PathBuf {
        self.output_dir().join("failure")
    }

    pub fn model_dir(&self) -> PathBuf {
        self.prefix.join("model")
    }

    /// `model/optimized.pkl`
    pub fn model(&self) -> PathBuf {
        self.model_dir().join("optimized.pkl")
    }
}
