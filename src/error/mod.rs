//! Error handling for the severity pipeline.

pub mod util;

use std::io;
use std::path::PathBuf;

/// Specialized error type for the severity pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Error opening or reading a file
    #[error("IO error for {}: {source}", .path.display())]
    Io {
        /// File that could not be accessed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Error parsing CSV input
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the input table
    #[error("Schema error: required column '{0}' not found")]
    MissingColumn(String),

    /// A Y-BOCS sub-score could not be interpreted as an integer
    #[error("Invalid score '{value}' in column '{column}' at row {row}")]
    InvalidScore {
        /// Column holding the score
        column: String,
        /// 1-based data row
        row: usize,
        /// Raw cell contents
        value: String,
    },

    /// A numeric feature cell is empty
    #[error("Missing value in numeric column '{column}' at row {row}")]
    MissingValue {
        /// Column with the empty cell
        column: String,
        /// 1-based data row
        row: usize,
    },

    /// A class has too few members for the requested operation
    #[error("Degenerate class: {0}")]
    DegenerateClass(String),

    /// There are no rows to work with
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A target label outside the fitted vocabulary
    #[error("Label '{0}' was not seen while fitting the target encoder")]
    UnseenLabel(String),

    /// Error serializing the run summary
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wrap an IO error together with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
