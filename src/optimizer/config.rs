//! Optimization configuration

use super::SamplerType;
use serde::{Deserialize, Serialize};

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizeDirection {
    Minimize,
    Maximize,
}

/// Configuration for hyperparameter optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Maximum number of trials, `None` for no cap
    pub n_trials: Option<usize>,

    /// Maximum time in seconds, checked before each trial starts
    pub timeout_secs: Option<f64>,

    /// Optimization direction
    pub direction: OptimizeDirection,

    /// Sampler type
    pub sampler: SamplerType,

    /// Number of initial random samples before optimization
    pub n_startup_trials: usize,

    /// Random seed for the sampler
    pub random_state: Option<u64>,

    /// Cross-validation folds for evaluation
    pub cv_folds: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            n_trials: None,
            timeout_secs: None,
            direction: OptimizeDirection::Minimize,
            sampler: SamplerType::TPE,
            n_startup_trials: 10,
            random_state: None,
            cv_folds: 5,
        }
    }
}

impl OptimizationConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set number of trials
    pub fn with_n_trials(mut self, n: usize) -> Self {
        self.n_trials = Some(n);
        self
    }

    /// Builder method to set timeout
    pub fn with_timeout(mut self, secs: f64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Builder method to set direction
    pub fn with_direction(mut self, direction: OptimizeDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Builder method to set sampler
    pub fn with_sampler(mut self, sampler: SamplerType) -> Self {
        self.sampler = sampler;
        self
    }

    /// Builder method to seed the sampler
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Builder method to set cross-validation folds
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }
}
