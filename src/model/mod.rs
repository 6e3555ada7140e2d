//! Gradient-boosted tree classifier
//!
//! [`tree`] grows single second-order regression trees; [`booster`] chains
//! them into a softmax ensemble.

pub mod booster;
pub mod tree;

pub use booster::{BoosterParams, GradientBoostedClassifier};
pub use tree::{RegressionTree, SortedColumns, TreeNode, TreeParams};
