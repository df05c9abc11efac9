//! boostfit - gradient boosting training entry point
//!
//! Reads CSV training data and a JSON hyperparameter file from the fixed
//! layout of a hosted training container, searches gradient boosting
//! hyperparameters under a wall-clock budget, refits the best candidate and
//! persists the model alongside a trace of every trial.
//!
//! # Modules
//!
//! - [`platform`] - Directory layout, hyperparameter file, failure report
//! - [`utils`] - Channel data loading
//! - [`training`] - Regression trees, gradient boosting, CV, metrics
//! - [`optimizer`] - Timeout-bounded hyperparameter search
//! - [`export`] - Model file and optimization trace
//! - [`pipeline`] - The end-to-end training run
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod training;
pub mod optimizer;

// Data and persistence
pub mod utils;
pub mod export;

// Container contract
pub mod platform;
pub mod pipeline;

// Services
pub mod cli;

pub use error::{Result, TrainError};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Result, TrainError};
    pub use crate::export::{load_model, save_model, ModelMetadata};
    pub use crate::optimizer::{HyperOptX, OptimizationConfig, OptimizeDirection, SearchSpace, Study};
    pub use crate::pipeline::{TrainingPipeline, TrainingReport};
    pub use crate::platform::{Hyperparameters, PlatformPaths};
    pub use crate::training::{GradientBoostingConfig, GradientBoostingRegressor, RegressionMetrics};
    pub use crate::utils::{DataLoader, Dataset};
}
