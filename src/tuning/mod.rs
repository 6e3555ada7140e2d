//! Hyperparameter tuning
//!
//! Expands a [`ParamGrid`](crate::config::ParamGrid) and scores every point
//! with stratified k-fold cross-validation.

pub mod grid;
pub mod search;

pub use grid::expand_grid;
pub use search::{CandidateScore, GridSearch, GridSearchResult};
