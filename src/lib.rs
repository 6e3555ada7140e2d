//! A Rust library for grading OCD severity from Y-BOCS sub-scores and training
//! a balanced gradient-boosted classifier on the remaining patient attributes.

pub mod config;
pub mod data;
pub mod encoding;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod resample;
pub mod split;
pub mod tuning;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{ParamGrid, PipelineConfig, PipelineConfigBuilder};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, RunOutcome};

// Data preparation
pub use data::{LabeledTable, RawTable, Severity, label_records, load_csv, read_csv};
pub use encoding::{FeatureEncoder, LabelEncoder, TargetEncoder};
pub use split::{
    Fold, TrainTestSplit, stratified_k_fold, stratified_train_test_split,
    stratified_train_test_split_named,
};

// Modelling
pub use model::{BoosterParams, GradientBoostedClassifier};
pub use resample::{Smote, SmoteTomek, TomekLinks};
pub use tuning::{CandidateScore, GridSearch, GridSearchResult};

// Reporting
pub use metrics::{
    ClassificationReport, ConfusionMatrix, accuracy, confusion_matrix, f1_macro, precision_recall_f1,
};
pub use report::{Heatmap, RunSummary};
