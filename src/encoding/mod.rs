//! Categorical-to-integer encoding
//!
//! Encoders are fitted on the training rows only. Feature categories that first
//! appear outside the training rows map to a reserved fallback code instead of
//! failing; target labels outside the training vocabulary are an error.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::data::labeler::{LabeledTable, Severity};
use crate::data::table::{ColumnData, FeatureMatrix};
use crate::error::{PipelineError, Result};

/// Maps each distinct value to its rank in sorted order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl LabelEncoder {
    /// Fit on the distinct values, sorted lexicographically
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        classes.sort_unstable();
        classes.dedup();

        let index = classes
            .iter()
            .enumerate()
            .map(|(code, class)| (class.clone(), code))
            .collect();

        Self { classes, index }
    }

    /// Code of a known value
    #[must_use]
    pub fn try_transform(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    /// Code of a value, or [`LabelEncoder::fallback_code`] when unseen
    #[must_use]
    pub fn transform(&self, value: &str) -> usize {
        self.try_transform(value).unwrap_or_else(|| self.fallback_code())
    }

    /// Value for a code
    #[must_use]
    pub fn inverse_transform(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Code reserved for values not seen while fitting
    #[must_use]
    pub fn fallback_code(&self) -> usize {
        self.classes.len()
    }

    /// Fitted values in code order
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of fitted values
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether nothing was fitted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ColumnEncoding {
    Passthrough,
    Categorical(LabelEncoder),
}

/// Per-column encoders turning a [`LabeledTable`] into a [`FeatureMatrix`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureEncoder {
    names: Vec<String>,
    encodings: Vec<ColumnEncoding>,
}

impl FeatureEncoder {
    /// Fit one encoder per categorical column using only `train_rows`
    pub fn fit(table: &LabeledTable, train_rows: &[usize]) -> Result<Self> {
        if train_rows.is_empty() {
            return Err(PipelineError::EmptyDataset(
                "cannot fit encoders without training rows".to_string(),
            ));
        }

        let mut names = Vec::with_capacity(table.columns().len());
        let mut encodings = Vec::with_capacity(table.columns().len());

        for column in table.columns() {
            let encoding = match &column.data {
                ColumnData::Numeric(_) => ColumnEncoding::Passthrough,
                ColumnData::Categorical(values) => {
                    let encoder =
                        LabelEncoder::fit(train_rows.iter().map(|&row| values[row].as_str()));
                    debug!(
                        "Column '{}' encoded with {} categories",
                        column.name,
                        encoder.len()
                    );
                    ColumnEncoding::Categorical(encoder)
                }
            };
            names.push(column.name.clone());
            encodings.push(encoding);
        }

        Ok(Self { names, encodings })
    }

    /// Encode the given rows, in order
    pub fn transform(&self, table: &LabeledTable, rows: &[usize]) -> Result<FeatureMatrix> {
        let columns = table.columns();
        if columns.len() != self.names.len()
            || columns.iter().zip(&self.names).any(|(c, n)| &c.name != n)
        {
            return Err(PipelineError::InvalidConfig(
                "table columns differ from the columns the encoder was fitted on".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(rows.len() * columns.len());
        let mut unseen = 0usize;

        for &row in rows {
            for (column, encoding) in columns.iter().zip(&self.encodings) {
                let value = match (&column.data, encoding) {
                    (ColumnData::Numeric(values), ColumnEncoding::Passthrough) => values[row],
                    (ColumnData::Categorical(values), ColumnEncoding::Categorical(encoder)) => {
                        let code = encoder.try_transform(&values[row]).unwrap_or_else(|| {
                            unseen += 1;
                            encoder.fallback_code()
                        });
                        code as f64
                    }
                    _ => {
                        return Err(PipelineError::InvalidConfig(format!(
                            "column '{}' changed type after fitting",
                            column.name
                        )));
                    }
                };
                data.push(value);
            }
        }

        if unseen > 0 {
            warn!("{unseen} categorical values were unseen during fitting and use the fallback code");
        }

        FeatureMatrix::new(self.names.clone(), data)
    }

    /// Encoder for a categorical column, if the column is categorical
    #[must_use]
    pub fn column_encoder(&self, name: &str) -> Option<&LabelEncoder> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| match &self.encodings[idx] {
                ColumnEncoding::Categorical(encoder) => Some(encoder),
                ColumnEncoding::Passthrough => None,
            })
    }

    /// Feature names in matrix column order
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }
}

/// Encoder for the severity target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEncoder {
    encoder: LabelEncoder,
}

impl TargetEncoder {
    /// Fit on the labels of the training rows
    pub fn fit(labels: &[Severity], train_rows: &[usize]) -> Result<Self> {
        let encoder = LabelEncoder::fit(train_rows.iter().map(|&row| labels[row].name()));
        if encoder.len() < 2 {
            return Err(PipelineError::DegenerateClass(format!(
                "training rows contain {} severity class(es), need at least 2",
                encoder.len()
            )));
        }
        Ok(Self { encoder })
    }

    /// Encode the labels of the given rows
    pub fn transform(&self, labels: &[Severity], rows: &[usize]) -> Result<Vec<usize>> {
        rows.iter()
            .map(|&row| {
                let name = labels[row].name();
                self.encoder
                    .try_transform(name)
                    .ok_or_else(|| PipelineError::UnseenLabel(name.to_string()))
            })
            .collect()
    }

    /// Label names in code order
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        self.encoder.classes()
    }

    /// Number of classes
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.encoder.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::labeler::CohortSummary;
    use crate::data::table::Column;

    fn labeled(genders: &[&str], ages: &[f64], severity: &[Severity]) -> LabeledTable {
        let summary = CohortSummary {
            labeled_rows: severity.len(),
            excluded_rows: 0,
            severity_counts: [0; 3],
            first_diagnosis: None,
            last_diagnosis: None,
        };
        LabeledTable::new(
            vec![
                Column {
                    name: "Gender".into(),
                    data: ColumnData::Categorical(genders.iter().map(|g| (*g).to_string()).collect()),
                },
                Column {
                    name: "Age".into(),
                    data: ColumnData::Numeric(ages.to_vec()),
                },
            ],
            severity.to_vec(),
            summary,
        )
        .unwrap()
    }

    #[test]
    fn classes_are_sorted_and_invertible() {
        let encoder = LabelEncoder::fit(["Severe", "Mild", "Moderate", "Mild"]);
        assert_eq!(encoder.classes(), &["Mild", "Moderate", "Severe"]);
        for value in ["Mild", "Moderate", "Severe"] {
            let code = encoder.try_transform(value).unwrap();
            assert_eq!(encoder.inverse_transform(code), Some(value));
        }
        assert_eq!(encoder.try_transform("Unknown"), None);
        assert_eq!(encoder.transform("Unknown"), 3);
    }

    #[test]
    fn feature_encoder_uses_training_vocabulary_only() {
        use Severity::{Mild, Severe};
        let table = labeled(
            &["Male", "Female", "Other", "Male"],
            &[30.0, 41.0, 25.0, 60.0],
            &[Mild, Severe, Mild, Severe],
        );
        let encoder = FeatureEncoder::fit(&table, &[0, 1, 3]).unwrap();

        let genders = encoder.column_encoder("Gender").unwrap();
        assert_eq!(genders.classes(), &["Female", "Male"]);
        assert!(encoder.column_encoder("Age").is_none());

        let matrix = encoder.transform(&table, &[2, 0]).unwrap();
        // "Other" was only in the held-out row
        assert_eq!(matrix.row(0), &[2.0, 25.0]);
        assert_eq!(matrix.row(1), &[1.0, 30.0]);
    }

    #[test]
    fn target_encoder_rejects_unseen_label() {
        use Severity::{Mild, Moderate, Severe};
        let labels = [Mild, Moderate, Mild, Severe];
        let encoder = TargetEncoder::fit(&labels, &[0, 1, 2]).unwrap();
        assert_eq!(encoder.class_names(), &["Mild", "Moderate"]);
        assert_eq!(encoder.transform(&labels, &[1, 0]).unwrap(), vec![1, 0]);
        assert!(matches!(
            encoder.transform(&labels, &[3]),
            Err(PipelineError::UnseenLabel(_))
        ));
    }

    #[test]
    fn target_encoder_needs_two_classes() {
        let labels = [Severity::Mild, Severity::Mild];
        assert!(matches!(
            TargetEncoder::fit(&labels, &[0, 1]),
            Err(PipelineError::DegenerateClass(_))
        ));
    }
}
