//! Sampling strategies for hyperparameter optimization

use super::config::OptimizeDirection;
use super::search_space::{SearchSpace, TrialParams};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Type of sampler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SamplerType {
    /// Random sampling
    Random,
    /// Tree-structured Parzen Estimator
    TPE,
}

/// Trait for hyperparameter samplers
pub trait Sampler: Send + Sync {
    /// Sample the next set of hyperparameters.
    ///
    /// `history` holds the completed trials in arrival order.
    fn sample(&mut self, search_space: &SearchSpace, history: &[(TrialParams, f64)]) -> TrialParams;
}

fn seeded_rng(seed: Option<u64>) -> Xoshiro256PlusPlus {
    match seed {
        Some(s) => Xoshiro256PlusPlus::seed_from_u64(s),
        None => Xoshiro256PlusPlus::from_entropy(),
    }
}

/// Random sampler
#[derive(Debug)]
pub struct RandomSampler {
    rng: Xoshiro256PlusPlus,
}

impl RandomSampler {
    /// Create a new random sampler
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded_rng(seed) }
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self, search_space: &SearchSpace, _history: &[(TrialParams, f64)]) -> TrialParams {
        search_space.sample(&mut self.rng)
    }
}

/// Tree-structured Parzen Estimator sampler
///
/// Random for the first `n_startup_trials`, then draws `n_candidates`
/// random points and keeps the one nearest the best `gamma` quantile of
/// completed trials. Distances are taken per parameter over its range.
#[derive(Debug)]
pub struct TPESampler {
    rng: Xoshiro256PlusPlus,
    n_startup_trials: usize,
    gamma: f64,
    n_candidates: usize,
    direction: OptimizeDirection,
}

impl TPESampler {
    /// Create a new TPE sampler
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seeded_rng(seed),
            n_startup_trials: 10,
            gamma: 0.25,
            n_candidates: 24,
            direction: OptimizeDirection::Minimize,
        }
    }

    /// Set number of startup trials
    pub fn with_n_startup(mut self, n: usize) -> Self {
        self.n_startup_trials = n;
        self
    }

    /// Set which end of the objective counts as good
    pub fn with_direction(mut self, direction: OptimizeDirection) -> Self {
        self.direction = direction;
        self
    }

    fn compute_similarity(
        &self,
        search_space: &SearchSpace,
        candidate: &TrialParams,
        good_trials: &[&TrialParams],
    ) -> f64 {
        if good_trials.is_empty() {
            return 0.0;
        }

        let mut total_sim = 0.0;

        for good in good_trials {
            let mut dist = 0.0;
            let mut count = 0;

            for param in search_space.parameters() {
                let a = candidate.get(&param.name).and_then(|v| param.coordinate(v));
                let b = good.get(&param.name).and_then(|v| param.coordinate(v));
                if let (Some(a), Some(b)) = (a, b) {
                    let d = (a - b) / param.span();
                    dist += d * d;
                    count += 1;
                }
            }

            if count > 0 {
                dist = (dist / count as f64).sqrt();
                total_sim += 1.0 / (1.0 + dist);
            }
        }

        total_sim / good_trials.len() as f64
    }
}

impl Sampler for TPESampler {
    fn sample(&mut self, search_space: &SearchSpace, history: &[(TrialParams, f64)]) -> TrialParams {
        if history.len() < self.n_startup_trials {
            return search_space.sample(&mut self.rng);
        }

        let mut sorted: Vec<&(TrialParams, f64)> = history.iter().collect();
        sorted.sort_by(|a, b| {
            let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
            match self.direction {
                OptimizeDirection::Minimize => ord,
                OptimizeDirection::Maximize => ord.reverse(),
            }
        });

        let n_good = ((sorted.len() as f64 * self.gamma).ceil() as usize).clamp(1, sorted.len().max(1));
        let good_trials: Vec<&TrialParams> = sorted.iter().take(n_good).map(|(p, _)| p).collect();

        let mut best_params = search_space.sample(&mut self.rng);
        let mut best_score = self.compute_similarity(search_space, &best_params, &good_trials);

        for _ in 1..self.n_candidates {
            let candidate = search_space.sample(&mut self.rng);
            let score = self.compute_similarity(search_space, &candidate, &good_trials);

            if score > best_score {
                best_score = score;
                best_params = candidate;
            }
        }

        best_params
    }
}

/// Create a sampler from type
pub fn create_sampler(
    sampler_type: SamplerType,
    seed: Option<u64>,
    n_startup_trials: usize,
    direction: OptimizeDirection,
) -> Box<dyn Sampler> {
    match sampler_type {
        SamplerType::Random => Box::new(RandomSampler::new(seed)),
        SamplerType::TPE => Box::new(
            TPESampler::new(seed)
                .with_n_startup(n_startup_trials)
                .with_direction(direction),
        ),
    }
}
