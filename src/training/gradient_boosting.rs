//! Gradient Boosting implementation
//!
//! Least-squares gradient boosted regression trees. Each stage fits a
//! [`DecisionTree`] to the current residuals and adds a shrunken copy of its
//! output to the running prediction.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTree;
use super::metrics::r2_score;
use crate::error::{Result, TrainError};

/// Gradient Boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Fraction of rows each tree is fitted on
    pub subsample: f64,
    /// Random seed, only used when `subsample < 1.0`
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: None,
        }
    }
}

impl GradientBoostingConfig {
    /// Builder method to set the number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Builder method to set the learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Builder method to set the maximum tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check that every parameter is in range
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(TrainError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: self.n_estimators.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(TrainError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                reason: "must be a positive finite number".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(TrainError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(TrainError::InvalidParameter {
                name: "subsample".to_string(),
                value: self.subsample.to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }
        Ok(())
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_prediction: f64,
    n_features: usize,
    feature_importances: Vec<f64>,
    is_fitted: bool,
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
            feature_importances: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit the gradient boosting model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(TrainError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(TrainError::TrainingError(
                "Cannot fit gradient boosting on an empty dataset".to_string(),
            ));
        }

        self.trees.clear();
        self.n_features = n_features;
        self.initial_prediction = y.mean().unwrap_or(0.0);

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        self.feature_importances = vec![0.0; n_features];

        for _ in 0..self.config.n_estimators {
            let residuals: Array1<f64> = y - &predictions;

            let mut tree = DecisionTree::new_regressor()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_split(self.config.min_samples_split)
                .with_min_samples_leaf(self.config.min_samples_leaf);

            if self.config.subsample < 1.0 {
                let rows = self.subsample_indices(n_samples, &mut rng);
                let x_sub = x.select(Axis(0), &rows);
                let r_sub = residuals.select(Axis(0), &rows);
                tree.fit(&x_sub, &r_sub)?;
            } else {
                tree.fit(x, &residuals)?;
            }

            // Every row moves, sampled or not.
            let tree_pred = tree.predict(x)?;
            predictions.scaled_add(self.config.learning_rate, &tree_pred);

            if let Some(tree_importance) = tree.feature_importances() {
                for (acc, imp) in self.feature_importances.iter_mut().zip(tree_importance.iter()) {
                    *acc += imp;
                }
            }

            self.trees.push(tree);
        }

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= total;
            }
        }

        self.is_fitted = true;
        Ok(())
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(TrainError::ModelNotFitted);
        }

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            let tree_pred = tree.predict(x)?;
            predictions.scaled_add(self.config.learning_rate, &tree_pred);
        }

        Ok(predictions)
    }

    /// R² of the predictions on `x` against `y`
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        r2_score(y, &predictions)
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn subsample_indices(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let sample_size = (((n as f64) * self.config.subsample).ceil() as usize).clamp(1, n);
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        indices.truncate(sample_size);
        indices.sort_unstable();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| i as f64 * 0.1).collect()).unwrap();

        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| row[0] * 2.0 + row[1] * 0.5 + 1.0)
            .collect();

        (x, y)
    }

    #[test]
    fn test_gradient_boosting_regressor() {
        let (x, y) = create_regression_data();
        let config = GradientBoostingConfig::default()
            .with_n_estimators(20)
            .with_learning_rate(0.1);

        let mut model = GradientBoostingRegressor::new(config);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.len(), 100);
        assert_eq!(model.n_trees(), 20);

        let mse: f64 = y
            .iter()
            .zip(predictions.iter())
            .map(|(yi, pi)| (yi - pi).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        let y_var = y.var(0.0);
        assert!(mse < y_var, "MSE ({}) should be less than variance ({})", mse, y_var);
    }

    #[test]
    fn test_more_rounds_fit_better() {
        let (x, y) = create_regression_data();

        let mut short = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_n_estimators(2));
        short.fit(&x, &y).unwrap();
        let mut long = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_n_estimators(50));
        long.fit(&x, &y).unwrap();

        assert!(long.score(&x, &y).unwrap() > short.score(&x, &y).unwrap());
        assert!(long.score(&x, &y).unwrap() > 0.95);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = create_regression_data();
        let config = GradientBoostingConfig::default().with_n_estimators(10);

        let mut a = GradientBoostingRegressor::new(config.clone());
        let mut b = GradientBoostingRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_subsample_with_seed() {
        let (x, y) = create_regression_data();
        let config = GradientBoostingConfig {
            n_estimators: 10,
            subsample: 0.5,
            random_state: Some(7),
            ..Default::default()
        };

        let mut model = GradientBoostingRegressor::new(config);
        model.fit(&x, &y).unwrap();
        assert!(model.score(&x, &y).unwrap() > 0.5);
    }

    #[test]
    fn test_feature_importances() {
        let (x, y) = create_regression_data();
        let mut model = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_n_estimators(10));
        model.fit(&x, &y).unwrap();

        let importances = model.feature_importances();
        assert_eq!(importances.len(), 2);

        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 0.01, "Sum of importances ({}) should be ~1", sum);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let (x, y) = create_regression_data();

        let mut zero_trees = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_n_estimators(0));
        assert!(matches!(zero_trees.fit(&x, &y), Err(TrainError::InvalidParameter { .. })));

        let mut bad_lr = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_learning_rate(-0.5));
        assert!(matches!(bad_lr.fit(&x, &y), Err(TrainError::InvalidParameter { .. })));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = GradientBoostingRegressor::new(GradientBoostingConfig::default());
        let (x, _) = create_regression_data();
        assert!(matches!(model.predict(&x), Err(TrainError::ModelNotFitted)));
    }
}
