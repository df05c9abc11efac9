//! Cross-validation and hold-out splitting

use crate::error::{Result, TrainError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use super::metrics::r2_score;

/// Cross-validation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 5, shuffle: true }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Number of folds this validator produces
    pub fn n_splits(&self) -> usize {
        match &self.strategy {
            CVStrategy::KFold { n_splits, .. } => *n_splits,
        }
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => self.k_fold_split(n_samples, *n_splits, *shuffle),
        }
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        if n_splits < 2 {
            return Err(TrainError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(TrainError::ValidationError(format!(
                "Cannot have number of splits n_splits={} greater than the number of samples: n_samples={}",
                n_splits, n_samples
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();

        if shuffle {
            let mut rng = match self.random_state {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            indices.shuffle(&mut rng);
        }

        // The first `n_samples % n_splits` folds carry one extra sample.
        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current += fold_size;
        }

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

/// Fit one regressor per fold and score R² on the held-out fold.
///
/// Folds run concurrently on the rayon pool and only read `x` and `y`.
/// Scores come back in fold order.
pub fn cross_val_score(
    config: &GradientBoostingConfig,
    x: &Array2<f64>,
    y: &Array1<f64>,
    cv: &CrossValidator,
) -> Result<CVResults> {
    if x.nrows() != y.len() {
        return Err(TrainError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }

    let splits = cv.split(x.nrows())?;

    let scores = splits
        .par_iter()
        .map(|split| {
            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train = y.select(Axis(0), &split.train_indices);
            let x_test = x.select(Axis(0), &split.test_indices);
            let y_test = y.select(Axis(0), &split.test_indices);

            let mut model = GradientBoostingRegressor::new(config.clone());
            model.fit(&x_train, &y_train)?;
            let predictions = model.predict(&x_test)?;
            r2_score(&y_test, &predictions)
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(CVResults::from_scores(scores))
}

/// Hold-out partition of a feature matrix and its labels
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Shuffle rows with a seeded RNG and hold out `ceil(test_size * n)` of them.
///
/// The first permuted indices form the test set, the rest the train set.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    random_state: u64,
) -> Result<TrainTestSplit> {
    let n_samples = x.nrows();

    if n_samples != y.len() {
        return Err(TrainError::ShapeError {
            expected: format!("y length = {}", n_samples),
            actual: format!("y length = {}", y.len()),
        });
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(TrainError::ValidationError(format!(
            "With n_samples={}, test_size={} the resulting train set would be empty",
            n_samples, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), train_idx),
        x_test: x.select(Axis(0), test_idx),
        y_train: y.select(Axis(0), train_idx),
        y_test: y.select(Axis(0), test_idx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * (j + 1)) as f64 * 0.5);
        let y: Array1<f64> = x.rows().into_iter().map(|r| 3.0 * r[0] - r[1] + 2.0).collect();
        (x, y)
    }

    #[test]
    fn test_k_fold() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        let splits = cv.split(100).unwrap();

        assert_eq!(splits.len(), 5);

        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
        }

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_k_fold_uneven_sizes() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: true }).with_random_state(42);
        let splits = cv.split(12).unwrap();

        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2, 2]);
    }

    #[test]
    fn test_k_fold_seeded_shuffle_is_reproducible() {
        let cv = CrossValidator::new(CVStrategy::default()).with_random_state(42);
        let a = cv.split(50).unwrap();
        let b = cv.split(50).unwrap();

        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_k_fold_too_few_samples() {
        let cv = CrossValidator::new(CVStrategy::default());
        assert!(cv.split(3).is_err());
    }

    #[test]
    fn test_train_test_split_sizes() {
        let (x, y) = linear_data(11);
        let split = train_test_split(&x, &y, 0.2, 39).unwrap();

        // ceil(0.2 * 11) = 3
        assert_eq!(split.x_test.nrows(), 3);
        assert_eq!(split.x_train.nrows(), 8);
        assert_eq!(split.y_test.len(), 3);
        assert_eq!(split.y_train.len(), 8);
        assert_eq!(split.x_train.ncols(), 2);
    }

    #[test]
    fn test_train_test_split_is_deterministic() {
        let (x, y) = linear_data(40);
        let a = train_test_split(&x, &y, 0.2, 39).unwrap();
        let b = train_test_split(&x, &y, 0.2, 39).unwrap();
        assert_eq!(a.y_test, b.y_test);
        assert_eq!(a.x_train, b.x_train);
    }

    #[test]
    fn test_train_test_split_keeps_rows_aligned() {
        let (x, y) = linear_data(30);
        let split = train_test_split(&x, &y, 0.2, 39).unwrap();

        for (row, label) in split.x_test.rows().into_iter().zip(split.y_test.iter()) {
            assert_eq!(3.0 * row[0] - row[1] + 2.0, *label);
        }
    }

    #[test]
    fn test_train_test_split_needs_two_rows() {
        let (x, y) = linear_data(1);
        assert!(train_test_split(&x, &y, 0.2, 39).is_err());
    }

    #[test]
    fn test_cross_val_score() {
        let (x, y) = linear_data(60);
        let cv = CrossValidator::new(CVStrategy::default()).with_random_state(42);
        let config = GradientBoostingConfig::default().with_n_estimators(30);

        let results = cross_val_score(&config, &x, &y, &cv).unwrap();

        assert_eq!(results.n_folds, 5);
        assert_eq!(results.scores.len(), 5);
        assert!(results.mean_score > 0.8, "mean R² too low: {}", results.mean_score);
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.5, 0.7, 0.9]);
        assert!((results.mean_score - 0.7).abs() < 1e-12);
        assert!(results.std_score > 0.0);
    }
}
