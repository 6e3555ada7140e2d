//! Multi-class gradient-boosted tree classifier
//!
//! Softmax objective with one regression tree per class per round. Each round
//! draws a Bernoulli row sample, and each tree draws its own column sample.
//! Trees are fitted sequentially; every tree corrects the cumulative margin of
//! the trees before it.

use std::fmt;

use log::debug;
use rand::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use crate::data::table::{Dataset, FeatureMatrix};
use crate::error::{PipelineError, Result};
use crate::model::tree::{RegressionTree, SortedColumns, TreeParams};

/// Lower bound on the softmax hessian
const MIN_HESSIAN: f64 = 1e-16;

/// Hyperparameters of a boosted ensemble
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoosterParams {
    /// Boosting rounds
    pub n_estimators: usize,
    /// Maximum depth of every tree
    pub max_depth: usize,
    /// Shrinkage applied to every leaf
    pub learning_rate: f64,
    /// Fraction of rows sampled per round
    pub subsample: f64,
    /// Fraction of columns sampled per tree
    pub colsample_bytree: f64,
    /// L2 penalty on leaf weights
    pub reg_lambda: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
    /// Minimum gain required to split
    pub gamma: f64,
    /// Seed for row and column sampling
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.3,
            subsample: 1.0,
            colsample_bytree: 1.0,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            gamma: 0.0,
            seed: 42,
        }
    }
}

impl BoosterParams {
    const fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            reg_lambda: self.reg_lambda,
            min_child_weight: self.min_child_weight,
            gamma: self.gamma,
            learning_rate: self.learning_rate,
        }
    }
}

impl fmt::Display for BoosterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "colsample_bytree={}, learning_rate={}, max_depth={}, n_estimators={}, subsample={}",
            self.colsample_bytree, self.learning_rate, self.max_depth, self.n_estimators, self.subsample
        )
    }
}

/// Fitted softmax gradient-boosted classifier
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostedClassifier {
    /// `rounds[r][k]` is the tree of round `r` for class `k`
    rounds: Vec<Vec<RegressionTree>>,
    n_classes: usize,
    n_features: usize,
    params: BoosterParams,
}

impl GradientBoostedClassifier {
    /// Fit an ensemble on class codes `0..n_classes`
    pub fn fit(data: &Dataset, n_classes: usize, params: &BoosterParams) -> Result<Self> {
        if data.is_empty() {
            return Err(PipelineError::EmptyDataset(
                "cannot fit a classifier without rows".to_string(),
            ));
        }
        if n_classes < 2 {
            return Err(PipelineError::DegenerateClass(format!(
                "classification needs at least 2 classes, got {n_classes}"
            )));
        }
        if let Some(&label) = data.labels.iter().find(|&&l| l >= n_classes) {
            return Err(PipelineError::InvalidConfig(format!(
                "label {label} is outside 0..{n_classes}"
            )));
        }

        let matrix = &data.features;
        let n_rows = data.len();
        let n_features = matrix.n_cols();
        let sorted = SortedColumns::new(matrix);
        let tree_params = params.tree_params();
        let n_sampled_columns = ((params.colsample_bytree * n_features as f64).floor() as usize).clamp(1, n_features);

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut margins = vec![0.0; n_rows * n_classes];
        let mut grad = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];
        let mut rounds = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let probabilities: Vec<f64> = margins.chunks_exact(n_classes).flat_map(softmax).collect();

            let in_sample: Vec<bool> = if params.subsample < 1.0 {
                (0..n_rows).map(|_| rng.random::<f64>() < params.subsample).collect()
            } else {
                vec![true; n_rows]
            };

            let mut round = Vec::with_capacity(n_classes);
            for class in 0..n_classes {
                for row in 0..n_rows {
                    let p = probabilities[row * n_classes + class];
                    let target = if data.labels[row] == class { 1.0 } else { 0.0 };
                    grad[row] = p - target;
                    hess[row] = (2.0 * p * (1.0 - p)).max(MIN_HESSIAN);
                }

                let features: Vec<usize> = if n_sampled_columns < n_features {
                    let mut picked = rand::seq::index::sample(&mut rng, n_features, n_sampled_columns).into_vec();
                    picked.sort_unstable();
                    picked
                } else {
                    (0..n_features).collect()
                };

                let tree = RegressionTree::fit(matrix, &sorted, &grad, &hess, &in_sample, &features, &tree_params);
                for (row, values) in matrix.rows().enumerate() {
                    margins[row * n_classes + class] += tree.predict(values);
                }
                round.push(tree);
            }
            rounds.push(round);
        }

        debug!(
            "Fitted {} rounds x {n_classes} trees on {n_rows} rows ({params})",
            rounds.len()
        );

        Ok(Self {
            rounds,
            n_classes,
            n_features,
            params: *params,
        })
    }

    /// Raw per-class scores for one row
    #[must_use]
    pub fn predict_margin(&self, row: &[f64]) -> Vec<f64> {
        let mut margins = vec![0.0; self.n_classes];
        for round in &self.rounds {
            for (margin, tree) in margins.iter_mut().zip(round) {
                *margin += tree.predict(row);
            }
        }
        margins
    }

    /// Per-class probabilities for one row
    #[must_use]
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        softmax(&self.predict_margin(row))
    }

    /// Most probable class for one row (lowest code on ties)
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> usize {
        argmax(&self.predict_margin(row))
    }

    /// Predicted class of every row
    #[must_use]
    pub fn predict_batch(&self, matrix: &FeatureMatrix) -> Vec<usize> {
        let rows: Vec<&[f64]> = matrix.rows().collect();
        rows.par_iter().map(|row| self.predict(row)).collect()
    }

    /// Number of classes
    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of input features
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of boosting rounds
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.rounds.len()
    }

    /// Hyperparameters the model was fitted with
    #[must_use]
    pub const fn params(&self) -> &BoosterParams {
        &self.params
    }
}

/// Numerically stable softmax
fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value, first on ties
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = idx;
        }
    }
    best
}
