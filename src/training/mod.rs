//! Model training module
//!
//! Provides the pieces the training pipeline is assembled from:
//! - Regression decision trees
//! - Least-squares gradient boosting
//! - K-fold cross-validation and hold-out splitting
//! - Regression metrics

pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod metrics;

pub use cross_validation::{
    cross_val_score, train_test_split, CVResults, CVSplit, CVStrategy, CrossValidator, TrainTestSplit,
};
pub use decision_tree::{DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use metrics::{r2_score, RegressionMetrics};
