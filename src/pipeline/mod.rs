//! End-to-end training run
//!
//! Load configuration and data, search `n_estimators`/`learning_rate` by
//! cross-validated R², refit the winner, score it on the held-out split and
//! persist the model together with the trial trace.

use ndarray::{Array1, Array2};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::error::{Result, TrainError};
use crate::export::{save_model, write_trace, ModelMetadata};
use crate::optimizer::{
    HyperOptX, OptimizationConfig, OptimizeDirection, SamplerType, SearchSpace, Study, TrialParams,
};
use crate::platform::{Hyperparameters, PlatformPaths, TRAINING_CHANNEL};
use crate::training::{
    cross_val_score, train_test_split, CVStrategy, CrossValidator, GradientBoostingConfig,
    GradientBoostingRegressor, RegressionMetrics,
};
use crate::utils::DataLoader;

/// Share of rows held out for the final evaluation
pub const TEST_SIZE: f64 = 0.2;
/// Seed of the train/test permutation
pub const SPLIT_SEED: u64 = 39;
/// Seed of the cross-validation shuffle
pub const CV_SEED: u64 = 42;
pub const CV_FOLDS: usize = 5;

const MODEL_TYPE: &str = "gradient_boosting_regressor";

/// `n_estimators` in [1, 100], `learning_rate` uniform in [0.01, 1.0]
pub fn search_space() -> SearchSpace {
    SearchSpace::new()
        .int("n_estimators", 1, 100)
        .float("learning_rate", 0.01, 1.0)
}

/// Turn a sampled candidate into a regressor configuration
pub fn model_config(params: &TrialParams) -> Result<GradientBoostingConfig> {
    let n_estimators = params
        .get("n_estimators")
        .and_then(|v| v.as_int())
        .ok_or_else(|| TrainError::OptimizationError("Candidate has no integer n_estimators".to_string()))?;
    let learning_rate = params
        .get("learning_rate")
        .and_then(|v| v.as_float())
        .ok_or_else(|| TrainError::OptimizationError("Candidate has no learning_rate".to_string()))?;

    if n_estimators < 1 {
        return Err(TrainError::InvalidParameter {
            name: "n_estimators".to_string(),
            value: n_estimators.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let config = GradientBoostingConfig::default()
        .with_n_estimators(n_estimators as usize)
        .with_learning_rate(learning_rate);
    config.validate()?;
    Ok(config)
}

/// Cross-validated score of a candidate on the training split
pub struct Objective<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    cv: CrossValidator,
}

impl<'a> Objective<'a> {
    /// Shuffled `n_folds`-fold CV seeded with [`CV_SEED`]
    pub fn new(x: &'a Array2<f64>, y: &'a Array1<f64>, n_folds: usize) -> Self {
        let cv = CrossValidator::new(CVStrategy::KFold {
            n_splits: n_folds,
            shuffle: true,
        })
        .with_random_state(CV_SEED);

        Self { x, y, cv }
    }

    pub fn n_folds(&self) -> usize {
        self.cv.n_splits()
    }

    /// Mean R² over the folds
    pub fn evaluate(&self, params: &TrialParams) -> Result<f64> {
        let config = model_config(params)?;
        let results = cross_val_score(&config, self.x, self.y, &self.cv)?;
        Ok(results.mean_score)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub best_params: TrialParams,
    /// Mean CV R² of the best trial
    pub best_cv_score: f64,
    /// Held-out evaluation of the refitted model
    pub test_metrics: RegressionMetrics,
    pub n_trials: usize,
    pub search_duration_secs: f64,
    pub longest_trial_secs: f64,
    pub model_path: PathBuf,
    pub trace_path: PathBuf,
}

/// One training job against a platform directory layout
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    paths: PlatformPaths,
    loader: DataLoader,
    sampler_seed: Option<u64>,
}

impl TrainingPipeline {
    pub fn new(paths: PlatformPaths) -> Self {
        Self {
            paths,
            loader: DataLoader::new(),
            sampler_seed: None,
        }
    }

    /// Seed the candidate sampler
    pub fn with_sampler_seed(mut self, seed: u64) -> Self {
        self.sampler_seed = Some(seed);
        self
    }

    /// Run every stage in order; the first error aborts the job.
    pub fn run(&self) -> Result<TrainingReport> {
        let start = Instant::now();

        let hyperparameters = Hyperparameters::load(&self.paths.hyperparameters())?;
        let dataset = self
            .loader
            .load_channel(&self.paths.training_dir(), TRAINING_CHANNEL)?;
        let (x, y) = dataset.split_label()?;

        let split = train_test_split(&x, &y, TEST_SIZE, SPLIT_SEED)?;
        info!(
            train = ?split.x_train.shape(),
            test = ?split.x_test.shape(),
            "Split data into train and test sets"
        );

        let space = search_space();
        let study = self.search(&split.x_train, &split.y_train, &space, &hyperparameters)?;

        let best = study.require_best_trial()?;
        let best_params = best.params.clone();
        let best_cv_score = best.value;
        let config = model_config(&best_params)?;

        info!(
            trial = best.trial_id,
            n_estimators = config.n_estimators,
            learning_rate = config.learning_rate,
            cv_r2 = best_cv_score,
            "Best trial"
        );

        let mut model = GradientBoostingRegressor::new(config.clone());
        model.fit(&split.x_train, &split.y_train)?;
        let predictions = model.predict(&split.x_test)?;
        let test_metrics = RegressionMetrics::compute(&split.y_test, &predictions)?;

        info!(r2 = test_metrics.r2, rmse = test_metrics.rmse, "Test set score");

        let metadata = ModelMetadata::new(MODEL_TYPE)
            .with_n_features(model.n_features())
            .add_hyperparameter("n_estimators", config.n_estimators)
            .add_hyperparameter("learning_rate", config.learning_rate)
            .add_metric("cv_r2", best_cv_score)
            .add_metric("test_r2", test_metrics.r2);

        let model_path = self.paths.model();
        save_model(&model, &model_path, metadata)?;
        info!(path = %model_path.display(), "Saved model");

        let trace_path = self.paths.trace();
        write_trace(&study, &space, &trace_path)?;
        info!(path = %trace_path.display(), trials = study.trials.len(), "Saved optimization trace");

        let longest_trial_secs = study
            .trials
            .iter()
            .map(|t| t.duration_secs)
            .fold(0.0, f64::max);

        info!(elapsed = ?start.elapsed(), "Training complete");

        Ok(TrainingReport {
            best_params,
            best_cv_score,
            test_metrics,
            n_trials: study.trials.len(),
            search_duration_secs: study.total_duration_secs,
            longest_trial_secs,
            model_path,
            trace_path,
        })
    }

    fn search(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        space: &SearchSpace,
        hyperparameters: &Hyperparameters,
    ) -> Result<Study> {
        let mut config = OptimizationConfig::new()
            .with_direction(OptimizeDirection::Maximize)
            .with_timeout(hyperparameters.seconds as f64)
            .with_sampler(SamplerType::TPE)
            .with_cv_folds(CV_FOLDS);
        if let Some(seed) = self.sampler_seed {
            config = config.with_random_state(seed);
        }

        info!(seconds = hyperparameters.seconds, "Starting hyperparameter search");

        let objective = Objective::new(x_train, y_train, config.cv_folds);
        let mut optimizer = HyperOptX::new(config, space.clone());
        optimizer.optimize(|params| objective.evaluate(params))?;

        let study = optimizer.into_study();
        info!(
            trials = study.trials.len(),
            complete = study.n_complete(),
            folds = objective.n_folds(),
            elapsed_secs = study.total_duration_secs,
            "Hyperparameter search finished"
        );

        Ok(study)
    }
}
