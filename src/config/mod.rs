//! Configuration for the severity pipeline.

use std::fmt;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Default input file, read from the working directory
pub const DEFAULT_INPUT: &str = "OCD.csv";

/// Environment variable naming an SVG output path for the heatmap
pub const ENV_HEATMAP_SVG: &str = "OCD_HEATMAP_SVG";

/// Environment variable naming a JSON output path for the run summary
pub const ENV_SUMMARY_JSON: &str = "OCD_SUMMARY_JSON";

/// Environment variable limiting the number of worker threads
pub const ENV_JOBS: &str = "OCD_JOBS";

/// Hyperparameter grid for the boosted-tree search
///
/// Every axis must be non-empty; the search evaluates the full Cartesian product.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    /// Number of boosting rounds
    pub n_estimators: Vec<usize>,
    /// Maximum tree depth
    pub max_depth: Vec<usize>,
    /// Shrinkage applied to every leaf weight
    pub learning_rate: Vec<f64>,
    /// Fraction of rows sampled per round
    pub subsample: Vec<f64>,
    /// Fraction of columns sampled per tree
    pub colsample_bytree: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100],
            max_depth: vec![6, 8],
            learning_rate: vec![0.1, 0.2],
            subsample: vec![0.9],
            colsample_bytree: vec![0.8, 1.0],
        }
    }
}

impl ParamGrid {
    /// Number of grid points
    #[must_use]
    pub fn len(&self) -> usize {
        self.n_estimators.len()
            * self.max_depth.len()
            * self.learning_rate.len()
            * self.subsample.len()
            * self.colsample_bytree.len()
    }

    /// Whether any axis is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "parameter grid has an empty axis".to_string(),
            ));
        }
        if self.n_estimators.contains(&0) || self.max_depth.contains(&0) {
            return Err(PipelineError::InvalidConfig(
                "n_estimators and max_depth must be positive".to_string(),
            ));
        }
        if self.learning_rate.iter().any(|&v| !(v > 0.0)) {
            return Err(PipelineError::InvalidConfig(
                "learning_rate must be positive".to_string(),
            ));
        }
        let unit = |v: &f64| *v > 0.0 && *v <= 1.0;
        if !self.subsample.iter().all(unit) || !self.colsample_bytree.iter().all(unit) {
            return Err(PipelineError::InvalidConfig(
                "subsample and colsample_bytree must lie in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// CSV file to read
    pub input_path: PathBuf,
    /// Fraction of rows held out for testing
    pub test_fraction: f64,
    /// Seed shared by every stochastic stage
    pub random_seed: u64,
    /// Number of stratified cross-validation folds
    pub cv_folds: usize,
    /// Neighbours considered when synthesising minority rows
    pub smote_neighbors: usize,
    /// Hyperparameter grid
    pub param_grid: ParamGrid,
    /// Worker threads for the search (`None` uses every core)
    pub n_jobs: Option<usize>,
    /// Show progress bars on stderr
    pub show_progress: bool,
    /// Write the confusion-matrix heatmap as SVG here
    pub heatmap_svg: Option<PathBuf>,
    /// Write the JSON run summary here
    pub summary_json: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            test_fraction: 0.2,
            random_seed: 42,
            cv_folds: 5,
            smote_neighbors: 5,
            param_grid: ParamGrid::default(),
            n_jobs: None,
            show_progress: true,
            heatmap_svg: None,
            summary_json: None,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder starting from the defaults
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Build a configuration from command-line arguments and the environment
    ///
    /// The first positional argument, if present, replaces the input path.
    /// `OCD_HEATMAP_SVG`, `OCD_SUMMARY_JSON` and `OCD_JOBS` override the
    /// corresponding fields.
    pub fn from_args_and_env<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_args_and_lookup(args, |key| std::env::var(key).ok())
    }

    /// Same as [`PipelineConfig::from_args_and_env`] with variables read through `lookup`
    pub fn from_args_and_lookup<I, F>(args: I, lookup: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(path) = args.into_iter().next() {
            builder = builder.input_path(path);
        }
        if let Some(path) = lookup(ENV_HEATMAP_SVG) {
            builder = builder.heatmap_svg(path);
        }
        if let Some(path) = lookup(ENV_SUMMARY_JSON) {
            builder = builder.summary_json(path);
        }
        if let Some(jobs) = lookup(ENV_JOBS) {
            let jobs = jobs.trim().parse::<usize>().map_err(|_| {
                PipelineError::InvalidConfig(format!("{ENV_JOBS} must be a positive integer, got '{jobs}'"))
            })?;
            builder = builder.n_jobs(jobs);
        }

        builder.build()
    }

    /// Check that every value is in range
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.cv_folds < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.smote_neighbors == 0 {
            return Err(PipelineError::InvalidConfig(
                "smote_neighbors must be positive".to_string(),
            ));
        }
        if self.n_jobs == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "n_jobs must be positive".to_string(),
            ));
        }
        self.param_grid.validate()
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Input: {}", self.input_path.display())?;
        writeln!(f, "  Test Fraction: {}", self.test_fraction)?;
        writeln!(f, "  Random Seed: {}", self.random_seed)?;
        writeln!(f, "  CV Folds: {}", self.cv_folds)?;
        writeln!(f, "  SMOTE Neighbours: {}", self.smote_neighbors)?;
        writeln!(f, "  Grid Points: {}", self.param_grid.len())?;
        match self.n_jobs {
            Some(jobs) => writeln!(f, "  Worker Threads: {jobs}")?,
            None => writeln!(f, "  Worker Threads: all ({})", num_cpus::get())?,
        }
        if let Some(path) = &self.heatmap_svg {
            writeln!(f, "  Heatmap SVG: {}", path.display())?;
        }
        if let Some(path) = &self.summary_json {
            writeln!(f, "  Summary JSON: {}", path.display())?;
        }
        Ok(())
    }
}

/// Builder for constructing a pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input CSV path
    #[must_use]
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_path = path.into();
        self
    }

    /// Set the held-out test fraction
    #[must_use]
    pub const fn test_fraction(mut self, fraction: f64) -> Self {
        self.config.test_fraction = fraction;
        self
    }

    /// Set the random seed
    #[must_use]
    pub const fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Set the number of cross-validation folds
    #[must_use]
    pub const fn cv_folds(mut self, folds: usize) -> Self {
        self.config.cv_folds = folds;
        self
    }

    /// Set the SMOTE neighbour count
    #[must_use]
    pub const fn smote_neighbors(mut self, k: usize) -> Self {
        self.config.smote_neighbors = k;
        self
    }

    /// Replace the hyperparameter grid
    #[must_use]
    pub fn param_grid(mut self, grid: ParamGrid) -> Self {
        self.config.param_grid = grid;
        self
    }

    /// Limit the number of worker threads
    #[must_use]
    pub const fn n_jobs(mut self, jobs: usize) -> Self {
        self.config.n_jobs = Some(jobs);
        self
    }

    /// Enable or disable progress bars
    #[must_use]
    pub const fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    /// Write the heatmap SVG to this path
    #[must_use]
    pub fn heatmap_svg(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.heatmap_svg = Some(path.into());
        self
    }

    /// Write the JSON run summary to this path
    #[must_use]
    pub fn summary_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.summary_json = Some(path.into());
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
