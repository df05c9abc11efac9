//! HyperOptX - Main hyperparameter optimizer

use super::{
    config::{OptimizationConfig, OptimizeDirection},
    samplers::{create_sampler, Sampler},
    search_space::{SearchSpace, TrialParams},
};
use crate::error::{Result, TrainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

/// Final state of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialState {
    /// Objective returned a usable value
    Complete,
    /// Objective returned NaN
    Fail,
}

impl TrialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialState::Complete => "COMPLETE",
            TrialState::Fail => "FAIL",
        }
    }
}

/// Result of a single trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Trial number, starting at 0
    pub trial_id: usize,
    /// Parameters used
    pub params: TrialParams,
    /// Objective value
    pub value: f64,
    /// Wall-clock start
    pub datetime_start: DateTime<Utc>,
    /// Wall-clock end
    pub datetime_complete: DateTime<Utc>,
    /// Trial duration in seconds
    pub duration_secs: f64,
    /// Final state
    pub state: TrialState,
}

/// Study containing all trials in arrival order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Study {
    /// All trial results
    pub trials: Vec<TrialResult>,
    /// Best trial index
    pub best_trial_idx: Option<usize>,
    /// Total duration
    pub total_duration_secs: f64,
    /// Optimization direction
    pub direction: OptimizeDirection,
}

impl Study {
    /// Create a new study
    pub fn new(direction: OptimizeDirection) -> Self {
        Self {
            trials: Vec::new(),
            best_trial_idx: None,
            total_duration_secs: 0.0,
            direction,
        }
    }

    /// Get the best trial
    pub fn best_trial(&self) -> Option<&TrialResult> {
        self.best_trial_idx.map(|idx| &self.trials[idx])
    }

    /// Get the best value
    pub fn best_value(&self) -> Option<f64> {
        self.best_trial().map(|t| t.value)
    }

    /// Best trial, or an error when no trial completed
    pub fn require_best_trial(&self) -> Result<&TrialResult> {
        self.best_trial().ok_or_else(|| {
            TrainError::OptimizationError(format!(
                "No trials completed out of {} attempted; increase the search budget",
                self.trials.len()
            ))
        })
    }

    /// Number of trials that completed
    pub fn n_complete(&self) -> usize {
        self.trials.iter().filter(|t| t.state == TrialState::Complete).count()
    }

    /// Add a trial result
    pub fn add_trial(&mut self, result: TrialResult) {
        let idx = self.trials.len();

        let is_better = match self.best_trial_idx {
            None => true,
            Some(best_idx) => {
                let best_val = self.trials[best_idx].value;
                match self.direction {
                    OptimizeDirection::Minimize => result.value < best_val,
                    OptimizeDirection::Maximize => result.value > best_val,
                }
            }
        };

        if is_better && result.state == TrialState::Complete {
            self.best_trial_idx = Some(idx);
        }

        self.trials.push(result);
    }
}

/// Main hyperparameter optimizer
pub struct HyperOptX {
    config: OptimizationConfig,
    search_space: SearchSpace,
    sampler: Box<dyn Sampler>,
    study: Study,
}

impl HyperOptX {
    /// Create a new optimizer
    pub fn new(config: OptimizationConfig, search_space: SearchSpace) -> Self {
        let sampler = create_sampler(
            config.sampler.clone(),
            config.random_state,
            config.n_startup_trials,
            config.direction,
        );
        let study = Study::new(config.direction);

        Self {
            config,
            search_space,
            sampler,
            study,
        }
    }

    /// Run trials until the trial cap or the timeout is reached.
    ///
    /// The timeout is only checked between trials; a running trial is never
    /// interrupted. An error from the objective aborts the whole search.
    pub fn optimize<F>(&mut self, objective: F) -> Result<&Study>
    where
        F: Fn(&TrialParams) -> Result<f64>,
    {
        let start = Instant::now();
        let timeout = self.config.timeout_secs;
        let mut history: Vec<(TrialParams, f64)> = Vec::new();
        let mut trial_id = self.study.trials.len();

        loop {
            if let Some(n) = self.config.n_trials {
                if trial_id >= n {
                    break;
                }
            }

            if let Some(t) = timeout {
                if start.elapsed().as_secs_f64() >= t {
                    info!(trials = trial_id, timeout_secs = t, "Search budget exhausted");
                    break;
                }
            }

            let params = self.sampler.sample(&self.search_space, &history);

            let datetime_start = Utc::now();
            let trial_start = Instant::now();

            let value = objective(&params).map_err(|e| {
                error!(trial = trial_id, error = %e, "Trial raised an error");
                e
            })?;

            let state = if value.is_nan() {
                TrialState::Fail
            } else {
                history.push((params.clone(), value));
                TrialState::Complete
            };

            let result = TrialResult {
                trial_id,
                params,
                value,
                datetime_start,
                datetime_complete: Utc::now(),
                duration_secs: trial_start.elapsed().as_secs_f64(),
                state,
            };

            self.study.add_trial(result);

            info!(
                trial = trial_id,
                value = value,
                state = state.as_str(),
                best = self.study.best_value().unwrap_or(f64::NAN),
                "Trial finished"
            );

            trial_id += 1;
        }

        self.study.total_duration_secs = start.elapsed().as_secs_f64();

        Ok(&self.study)
    }

    /// Get the study results
    pub fn study(&self) -> &Study {
        &self.study
    }

    /// Consume the optimizer and keep its study
    pub fn into_study(self) -> Study {
        self.study
    }
}
