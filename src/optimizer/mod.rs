//! Hyperparameter optimization module (HyperOptX)
//!
//! A sequential, time-boxed study:
//! - Search spaces of integer and float parameters
//! - Random and TPE-style samplers
//! - Trial history with per-trial timestamps and state

mod config;
mod optimizer;
mod samplers;
mod search_space;

pub use config::{OptimizationConfig, OptimizeDirection};
pub use optimizer::{HyperOptX, Study, TrialResult, TrialState};
pub use samplers::{create_sampler, RandomSampler, Sampler, SamplerType, TPESampler};
pub use search_space::{Parameter, ParameterType, ParameterValue, SearchSpace, TrialParams};
