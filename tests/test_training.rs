//! Integration tests for the model and search building blocks

use boostfit::optimizer::{HyperOptX, OptimizationConfig, OptimizeDirection, TrialState};
use boostfit::pipeline::{search_space, Objective, CV_FOLDS};
use boostfit::training::{
    cross_val_score, CVStrategy, CrossValidator, GradientBoostingConfig, GradientBoostingRegressor,
};
use ndarray::{Array1, Array2};

fn friedman_like(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 3), |(i, j)| (((i + 1) * (j + 3) * 37) % 101) as f64 / 10.0);
    let y = x
        .rows()
        .into_iter()
        .map(|r| r[0] * 2.0 + (r[1] - 5.0).powi(2) * 0.5 - r[2])
        .collect();
    (x, y)
}

#[test]
fn test_more_trees_fit_training_data_better() {
    let (x, y) = friedman_like(80);

    let mut small = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_n_estimators(2));
    let mut large = GradientBoostingRegressor::new(GradientBoostingConfig::default().with_n_estimators(60));
    small.fit(&x, &y).unwrap();
    large.fit(&x, &y).unwrap();

    assert!(large.score(&x, &y).unwrap() > small.score(&x, &y).unwrap());
    assert!(large.score(&x, &y).unwrap() > 0.9);
}

#[test]
fn test_cross_val_score_is_reproducible() {
    let (x, y) = friedman_like(60);
    let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: true }).with_random_state(42);
    let config = GradientBoostingConfig::default().with_n_estimators(20);

    let a = cross_val_score(&config, &x, &y, &cv).unwrap();
    let b = cross_val_score(&config, &x, &y, &cv).unwrap();

    assert_eq!(a.scores.len(), 5);
    assert_eq!(a.scores, b.scores);
}

#[test]
fn test_bounded_search_over_objective() {
    let (x, y) = friedman_like(60);
    let objective = Objective::new(&x, &y, CV_FOLDS);

    let config = OptimizationConfig::new()
        .with_direction(OptimizeDirection::Maximize)
        .with_n_trials(12)
        .with_random_state(3);
    let mut optimizer = HyperOptX::new(config, search_space());
    let study = optimizer.optimize(|p| objective.evaluate(p)).unwrap();

    assert_eq!(study.trials.len(), 12);
    assert!(study.trials.iter().all(|t| t.state == TrialState::Complete));

    let best = study.best_value().unwrap();
    assert!(study.trials.iter().all(|t| t.value <= best));
}
