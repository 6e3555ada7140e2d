//! In-memory table types shared by the pipeline stages
//!
//! Each stage consumes one of these values and produces a new one; nothing is
//! rewritten in place once constructed.

use crate::error::{PipelineError, Result};

/// Table of raw string cells, exactly as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table, checking that every row has one cell per header
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(PipelineError::InvalidConfig(format!(
                "row {} has {} cells, expected {}",
                idx + 1,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    /// Column names in file order
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Fail with `MissingColumn` for the first absent name
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        for name in names {
            if self.column_index(name).is_none() {
                return Err(PipelineError::MissingColumn((*name).to_string()));
            }
        }
        Ok(())
    }

    /// Cells of a named column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// All rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Typed contents of a feature column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Every cell parsed as a number
    Numeric(Vec<f64>),
    /// At least one cell is non-numeric; values kept verbatim
    Categorical(Vec<String>),
}

/// A named, typed feature column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name from the header row
    pub name: String,
    /// Column values
    pub data: ColumnData,
}

impl Column {
    /// Number of values
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
        }
    }

    /// Whether the column holds no values
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column needs categorical encoding
    #[must_use]
    pub const fn is_categorical(&self) -> bool {
        matches!(self.data, ColumnData::Categorical(_))
    }
}

/// Dense row-major matrix of numeric features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Create a matrix from column names and row-major values
    pub fn new(names: Vec<String>, data: Vec<f64>) -> Result<Self> {
        if names.is_empty() {
            return Err(PipelineError::EmptyDataset(
                "feature matrix needs at least one column".to_string(),
            ));
        }
        if data.len() % names.len() != 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "{} values cannot be split into rows of {} columns",
                data.len(),
                names.len()
            )));
        }
        Ok(Self { names, data })
    }

    /// Create a matrix from a list of rows
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let width = names.len();
        if let Some(row) = rows.iter().find(|row| row.len() != width) {
            return Err(PipelineError::InvalidConfig(format!(
                "row has {} values, expected {width}",
                row.len()
            )));
        }
        Self::new(names, rows.concat())
    }

    /// Number of rows
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.data.len() / self.names.len()
    }

    /// Number of columns
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    /// Column names
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// One row as a slice
    #[must_use]
    pub fn row(&self, idx: usize) -> &[f64] {
        let width = self.names.len();
        &self.data[idx * width..(idx + 1) * width]
    }

    /// A single value
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.names.len() + col]
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.names.len())
    }

    /// Append a row
    pub(crate) fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.names.len());
        self.data.extend_from_slice(row);
    }

    /// New matrix with the given rows, in the given order
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.names.len());
        for &idx in indices {
            data.extend_from_slice(self.row(idx));
        }
        Self {
            names: self.names.clone(),
            data,
        }
    }
}

/// Feature matrix paired with integer class codes
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Feature rows
    pub features: FeatureMatrix,
    /// One class code per row
    pub labels: Vec<usize>,
}

impl Dataset {
    /// Pair features with labels, checking lengths agree
    pub fn new(features: FeatureMatrix, labels: Vec<usize>) -> Result<Self> {
        if features.n_rows() != labels.len() {
            return Err(PipelineError::InvalidConfig(format!(
                "{} feature rows but {} labels",
                features.n_rows(),
                labels.len()
            )));
        }
        Ok(Self { features, labels })
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// New dataset restricted to the given rows
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select_rows(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Number of rows per class code
    #[must_use]
    pub fn class_counts(&self, n_classes: usize) -> Vec<usize> {
        class_counts(&self.labels, n_classes)
    }
}

/// Count occurrences of each class code in `0..n_classes`
///
/// Codes outside the range are ignored.
#[must_use]
pub fn class_counts(labels: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &label in labels {
        if let Some(count) = counts.get_mut(label) {
            *count += 1;
        }
    }
    counts
}
