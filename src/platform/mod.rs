//! Hosted training platform contract
//!
//! Fixed input/output locations, the hyperparameter file and the failure
//! report the platform reads when a job aborts.

pub mod failure;
pub mod hyperparameters;
pub mod paths;

pub use failure::{format_failure, write_failure, FAILURE_EXIT_CODE};
pub use hyperparameters::{Hyperparameters, DEFAULT_TIMEOUT_SECS};
pub use paths::{PlatformPaths, DEFAULT_PREFIX, TRAINING_CHANNEL};
