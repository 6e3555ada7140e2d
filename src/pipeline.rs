//! Straight-line orchestration of the severity classifier
//!
//! Each stage consumes the value produced by the previous one and returns a
//! new value; nothing is mutated in place. Encoders are fitted on the training
//! partition only, and rebalancing never sees held-out rows.

use std::time::Instant;

use log::info;

use crate::config::PipelineConfig;
use crate::data::{RawTable, Severity, label_records, load_csv};
use crate::data::table::Dataset;
use crate::encoding::{FeatureEncoder, TargetEncoder};
use crate::error::{PipelineError, Result};
use crate::metrics::{ClassificationReport, ConfusionMatrix};
use crate::model::BoosterParams;
use crate::report::{Heatmap, RunSummary};
use crate::resample::SmoteTomek;
use crate::split::{TrainTestSplit, stratified_train_test_split_named};
use crate::tuning::{GridSearch, GridSearchResult};
use crate::utils::logging::{log_stage_complete, log_stage_start};

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Held-out accuracy of the selected model
    pub accuracy: f64,
    /// Held-out per-class metrics
    pub report: ClassificationReport,
    /// Held-out confusion matrix
    pub confusion: ConfusionMatrix,
    /// Heatmap of the confusion matrix
    pub heatmap: Heatmap,
    /// Serializable record of the run
    pub summary: RunSummary,
    /// Parameters of the selected model
    pub best_params: BoosterParams,
    /// Row indices of the train/test partition
    pub split: TrainTestSplit,
    /// Predictions for the test rows, in `split.test` order
    pub predictions: Vec<usize>,
}

/// Runs every stage from CSV to metrics
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline for a validated configuration
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read the configured CSV and run every stage
    pub fn run(&self) -> Result<RunOutcome> {
        self.config.validate()?;
        let table = load_csv(&self.config.input_path)?;
        self.execute(table, true)
    }

    /// Run every stage on a table already in memory
    pub fn run_on_table(&self, table: RawTable) -> Result<RunOutcome> {
        self.config.validate()?;
        self.execute(table, false)
    }

    fn execute(&self, table: RawTable, from_disk: bool) -> Result<RunOutcome> {
        let start = Instant::now();
        let config = &self.config;
        info!("Starting severity pipeline\n{config}");

        let stage = Instant::now();
        log_stage_start("label", &format!("deriving severity for {} rows", table.n_rows()));
        let labeled = label_records(&table)?;
        info!("{}", labeled.summary());
        log_stage_complete("label", labeled.n_rows(), stage.elapsed());

        let stage = Instant::now();
        log_stage_start("split", &format!("holding out {:.0}% of rows", config.test_fraction * 100.0));
        let codes: Vec<usize> = labeled.severity().iter().map(|s| s.index()).collect();
        let band_names = Severity::ALL.map(Severity::name);
        let split = stratified_train_test_split_named(
            &codes,
            &band_names,
            config.test_fraction,
            config.random_seed,
        )?;
        log_stage_complete("split", split.train.len() + split.test.len(), stage.elapsed());

        let stage = Instant::now();
        log_stage_start("encode", "fitting encoders on training rows");
        let features = FeatureEncoder::fit(&labeled, &split.train)?;
        let target = TargetEncoder::fit(labeled.severity(), &split.train)?;
        let n_classes = target.n_classes();
        let class_names = target.class_names().to_vec();
        let train = Dataset::new(
            features.transform(&labeled, &split.train)?,
            target.transform(labeled.severity(), &split.train)?,
        )?;
        let test = Dataset::new(
            features.transform(&labeled, &split.test)?,
            target.transform(labeled.severity(), &split.test)?,
        )?;
        log_stage_complete("encode", train.len() + test.len(), stage.elapsed());

        let stage = Instant::now();
        log_stage_start("balance", &format!("SMOTE + Tomek on {} training rows", train.len()));
        let resampled = SmoteTomek::new(config.smote_neighbors, config.random_seed)
            .fit_resample(&train, n_classes)?;
        log_stage_complete("balance", resampled.dataset.len(), stage.elapsed());

        let stage = Instant::now();
        log_stage_start(
            "search",
            &format!("{} candidates, {}-fold cross-validation", config.param_grid.len(), config.cv_folds),
        );
        let search = self.search(&resampled.dataset, n_classes)?;
        log_stage_complete(
            "search",
            search.candidates.len() * config.cv_folds,
            stage.elapsed(),
        );

        let stage = Instant::now();
        log_stage_start("evaluate", &format!("scoring {} held-out rows", test.len()));
        let predictions = search.best_model.predict_batch(&test.features);
        let confusion = ConfusionMatrix::new(&test.labels, &predictions, n_classes);
        let report = ClassificationReport::from_confusion(&confusion, &class_names);
        let accuracy = confusion.accuracy();
        let heatmap = Heatmap::new(&confusion, &class_names);
        log_stage_complete("evaluate", test.len(), stage.elapsed());

        let best_params = search.best().params;
        let summary = RunSummary {
            input_path: from_disk.then(|| config.input_path.clone()),
            random_seed: config.random_seed,
            cohort: labeled.summary().clone(),
            feature_names: features.feature_names().to_vec(),
            class_names,
            train_rows: train.len(),
            test_rows: test.len(),
            resample: resampled.stats,
            candidates: search.candidates,
            best_params,
            accuracy,
            report: report.clone(),
            confusion_matrix: confusion.clone(),
        };

        if let Some(path) = &config.heatmap_svg {
            heatmap.write_svg(path)?;
        }
        if let Some(path) = &config.summary_json {
            summary.write_json(path)?;
        }

        info!(
            "Pipeline finished in {:?}: accuracy {accuracy:.4} with {best_params}",
            start.elapsed()
        );

        Ok(RunOutcome {
            accuracy,
            report,
            confusion,
            heatmap,
            summary,
            best_params,
            split,
            predictions,
        })
    }

    /// Grid search on a dedicated pool sized by `n_jobs`
    fn search(&self, data: &Dataset, n_classes: usize) -> Result<GridSearchResult> {
        let config = &self.config;
        let threads = config.n_jobs.unwrap_or_else(num_cpus::get);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| PipelineError::InvalidConfig(format!("failed to create thread pool: {e}")))?;

        let search = GridSearch::new(&config.param_grid, config.cv_folds, config.random_seed)?
            .with_progress(config.show_progress);
        pool.install(|| search.fit(data, n_classes))
    }
}
