//! Machine-readable record of a pipeline run

use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::CohortSummary;
use crate::error::util::create_output_file;
use crate::error::{PipelineError, Result};
use crate::metrics::{ClassificationReport, ConfusionMatrix};
use crate::model::BoosterParams;
use crate::resample::ResampleStats;
use crate::tuning::CandidateScore;

/// Everything a run decided and measured
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// CSV the run read, if it came from disk
    pub input_path: Option<PathBuf>,
    /// Seed shared by every stochastic stage
    pub random_seed: u64,
    /// Labelling statistics
    pub cohort: CohortSummary,
    /// Encoded feature columns
    pub feature_names: Vec<String>,
    /// Class names in code order
    pub class_names: Vec<String>,
    /// Rows in the training partition before rebalancing
    pub train_rows: usize,
    /// Rows in the held-out partition
    pub test_rows: usize,
    /// Rebalancing statistics
    pub resample: ResampleStats,
    /// Cross-validation scores of every candidate
    pub candidates: Vec<CandidateScore>,
    /// Parameters of the selected model
    pub best_params: BoosterParams,
    /// Held-out accuracy
    pub accuracy: f64,
    /// Held-out per-class metrics
    pub report: ClassificationReport,
    /// Held-out confusion matrix
    pub confusion_matrix: ConfusionMatrix,
}

impl RunSummary {
    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty-printed JSON to `path`, creating parent directories
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = create_output_file(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| PipelineError::io(path, e))?;
        log::info!("Wrote run summary to {}", path.display());
        Ok(())
    }
}
