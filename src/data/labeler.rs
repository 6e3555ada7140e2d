//! Severity labelling for Y-BOCS scored patients
//!
//! Derives the three-band severity label from the two sub-scores, drops the
//! identifier, date and score columns, and infers the type of every remaining
//! column. The input table is left untouched; a new [`LabeledTable`] is returned.

use std::fmt;

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use crate::data::loader::{COMPULSIONS_SCORE, DIAGNOSIS_DATE, OBSESSIONS_SCORE, PATIENT_ID};
use crate::data::table::{Column, ColumnData, RawTable};
use crate::error::{PipelineError, Result};
use crate::utils::logging::log_warning;

/// Upper bound (inclusive) of the mild band
pub const MILD_MAX_TOTAL: i64 = 15;
/// Upper bound (inclusive) of the moderate band
pub const MODERATE_MAX_TOTAL: i64 = 25;

/// Largest valid Y-BOCS sub-score
pub const MAX_SUBSCORE: i64 = 20;

/// Date formats tried, in order, for the diagnosis date
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"];

/// Severity band derived from the total Y-BOCS score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Total score of 15 or less
    Mild,
    /// Total score from 16 to 25
    Moderate,
    /// Total score above 25
    Severe,
}

impl Severity {
    /// Every band in ascending order
    pub const ALL: [Self; 3] = [Self::Mild, Self::Moderate, Self::Severe];

    /// Map a total score to its band; boundaries belong to the lower band
    #[must_use]
    pub const fn from_total(total: i64) -> Self {
        if total <= MILD_MAX_TOTAL {
            Self::Mild
        } else if total <= MODERATE_MAX_TOTAL {
            Self::Moderate
        } else {
            Self::Severe
        }
    }

    /// Band for a pair of sub-scores
    #[must_use]
    pub const fn from_scores(obsessions: i64, compulsions: i64) -> Self {
        Self::from_total(obsessions.saturating_add(compulsions))
    }

    /// Label string used in reports
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }

    /// Position in [`Severity::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptive statistics gathered while labelling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortSummary {
    /// Rows that received a label
    pub labeled_rows: usize,
    /// Rows excluded because a sub-score was empty
    pub excluded_rows: usize,
    /// Labelled rows per band, indexed by [`Severity::index`]
    pub severity_counts: [usize; 3],
    /// Earliest parseable diagnosis date
    pub first_diagnosis: Option<NaiveDate>,
    /// Latest parseable diagnosis date
    pub last_diagnosis: Option<NaiveDate>,
}

impl fmt::Display for CohortSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cohort Summary:")?;
        writeln!(f, "  Labelled Rows: {}", self.labeled_rows)?;
        writeln!(f, "  Excluded Rows: {}", self.excluded_rows)?;
        for severity in Severity::ALL {
            writeln!(f, "  {severity}: {}", self.severity_counts[severity.index()])?;
        }
        if let (Some(first), Some(last)) = (self.first_diagnosis, self.last_diagnosis) {
            writeln!(f, "  Diagnosis Dates: {first} to {last}")?;
        }
        Ok(())
    }
}

/// Feature columns plus the derived severity label
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    columns: Vec<Column>,
    severity: Vec<Severity>,
    summary: CohortSummary,
}

impl LabeledTable {
    /// Assemble a labelled table directly
    pub fn new(columns: Vec<Column>, severity: Vec<Severity>, summary: CohortSummary) -> Result<Self> {
        if let Some(column) = columns.iter().find(|c| c.len() != severity.len()) {
            return Err(PipelineError::InvalidConfig(format!(
                "column '{}' has {} values but there are {} labels",
                column.name,
                column.len(),
                severity.len()
            )));
        }
        Ok(Self {
            columns,
            severity,
            summary,
        })
    }

    /// Feature columns in input order
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// One label per row
    #[must_use]
    pub fn severity(&self) -> &[Severity] {
        &self.severity
    }

    /// Statistics gathered while labelling
    #[must_use]
    pub const fn summary(&self) -> &CohortSummary {
        &self.summary
    }

    /// Number of rows
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.severity.len()
    }
}

/// Label every row of a raw patient table
///
/// Rows where either sub-score is empty are excluded with a warning.
pub fn label_records(table: &RawTable) -> Result<LabeledTable> {
    table.require_columns(&[PATIENT_ID, DIAGNOSIS_DATE, OBSESSIONS_SCORE, COMPULSIONS_SCORE])?;

    let obsessions = table.column(OBSESSIONS_SCORE)?;
    let compulsions = table.column(COMPULSIONS_SCORE)?;
    let dates = table.column(DIAGNOSIS_DATE)?;

    let mut kept_rows = Vec::with_capacity(table.n_rows());
    let mut severity = Vec::with_capacity(table.n_rows());
    let mut severity_counts = [0usize; 3];
    let mut first_diagnosis: Option<NaiveDate> = None;
    let mut last_diagnosis: Option<NaiveDate> = None;
    let mut unparsed_dates = 0usize;

    for row in 0..table.n_rows() {
        if obsessions[row].is_empty() || compulsions[row].is_empty() {
            continue;
        }
        let obs = parse_score(obsessions[row], OBSESSIONS_SCORE, row + 1)?;
        let comp = parse_score(compulsions[row], COMPULSIONS_SCORE, row + 1)?;
        let band = Severity::from_scores(obs, comp);

        severity_counts[band.index()] += 1;
        severity.push(band);
        kept_rows.push(row);

        match parse_date(dates[row]) {
            Some(date) => {
                first_diagnosis = Some(first_diagnosis.map_or(date, |d| d.min(date)));
                last_diagnosis = Some(last_diagnosis.map_or(date, |d| d.max(date)));
            }
            None => unparsed_dates += 1,
        }
    }

    let excluded_rows = table.n_rows() - kept_rows.len();
    if excluded_rows > 0 {
        log_warning(
            &format!("Excluded {excluded_rows} rows with an empty Y-BOCS sub-score"),
            None,
        );
    }
    if unparsed_dates > 0 {
        debug!("{unparsed_dates} diagnosis dates could not be parsed");
    }
    if kept_rows.is_empty() {
        return Err(PipelineError::EmptyDataset(
            "no row has both Y-BOCS sub-scores".to_string(),
        ));
    }

    let dropped = [PATIENT_ID, DIAGNOSIS_DATE, OBSESSIONS_SCORE, COMPULSIONS_SCORE];
    let mut columns = Vec::new();
    for (idx, name) in table.headers().iter().enumerate() {
        if dropped.contains(&name.as_str()) {
            continue;
        }
        let cells: Vec<&str> = kept_rows
            .iter()
            .map(|&row| table.rows()[row][idx].as_str())
            .collect();
        columns.push(infer_column(name, &cells, &kept_rows)?);
    }

    let summary = CohortSummary {
        labeled_rows: kept_rows.len(),
        excluded_rows,
        severity_counts,
        first_diagnosis,
        last_diagnosis,
    };
    info!(
        "Labelled {} rows: {} mild, {} moderate, {} severe",
        summary.labeled_rows,
        severity_counts[Severity::Mild.index()],
        severity_counts[Severity::Moderate.index()],
        severity_counts[Severity::Severe.index()]
    );

    LabeledTable::new(columns, severity, summary)
}

fn parse_score(cell: &str, column: &str, row: usize) -> Result<i64> {
    let invalid = || PipelineError::InvalidScore {
        column: column.to_string(),
        row,
        value: cell.to_string(),
    };

    if let Ok(score) = cell.parse::<i64>() {
        return if (0..=MAX_SUBSCORE).contains(&score) { Ok(score) } else { Err(invalid()) };
    }
    // Integral floats such as "12.0" are accepted
    match parse_finite(cell) {
        Some(value) if value.fract() == 0.0 && (0.0..=MAX_SUBSCORE as f64).contains(&value) => {
            Ok(value as i64)
        }
        _ => Err(invalid()),
    }
}

/// Parse a finite floating-point number, rejecting `NaN` and infinities
fn parse_finite(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
}

/// Decide whether a column is numeric and convert it
///
/// A column is numeric when every non-empty cell is a finite number and at
/// least one cell is non-empty. Empty cells in a numeric column are an error.
fn infer_column(name: &str, cells: &[&str], source_rows: &[usize]) -> Result<Column> {
    let numeric = cells.iter().any(|c| !c.is_empty())
        && cells.iter().all(|c| c.is_empty() || parse_finite(c).is_some());

    let data = if numeric {
        let mut values = Vec::with_capacity(cells.len());
        for (cell, &row) in cells.iter().zip(source_rows) {
            let value = parse_finite(cell).ok_or_else(|| PipelineError::MissingValue {
                column: name.to_string(),
                row: row + 1,
            })?;
            values.push(value);
        }
        ColumnData::Numeric(values)
    } else {
        ColumnData::Categorical(cells.iter().map(|c| (*c).to_string()).collect())
    };

    Ok(Column {
        name: name.to_string(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    fn table(rows: &[&str]) -> RawTable {
        let mut input = String::from(
            "Patient ID,Age,Gender,OCD Diagnosis Date,Y-BOCS Score (Obsessions),Y-BOCS Score (Compulsions),Medications\n",
        );
        for row in rows {
            input.push_str(row);
            input.push('\n');
        }
        read_csv(input.as_bytes()).unwrap()
    }

    #[test]
    fn bands_follow_inclusive_low_policy() {
        assert_eq!(Severity::from_scores(8, 7), Severity::Mild);
        assert_eq!(Severity::from_total(15), Severity::Mild);
        assert_eq!(Severity::from_total(16), Severity::Moderate);
        assert_eq!(Severity::from_scores(10, 10), Severity::Moderate);
        assert_eq!(Severity::from_total(25), Severity::Moderate);
        assert_eq!(Severity::from_total(26), Severity::Severe);
        assert_eq!(Severity::from_scores(20, 20), Severity::Severe);
    }

    #[test]
    fn names_sort_in_band_order() {
        let mut names: Vec<&str> = Severity::ALL.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Mild", "Moderate", "Severe"]);
    }

    #[test]
    fn drops_identifier_date_and_scores() {
        let labeled = label_records(&table(&[
            "1,30,Male,2020-01-01,8,7,SSRI",
            "2,41,Female,2021-05-03,20,20,None",
        ]))
        .unwrap();

        let names: Vec<&str> = labeled.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Age", "Gender", "Medications"]);
        assert_eq!(labeled.severity(), &[Severity::Mild, Severity::Severe]);
        assert!(!labeled.columns()[0].is_categorical());
        assert!(labeled.columns()[1].is_categorical());
    }

    #[test]
    fn summary_tracks_dates_and_exclusions() {
        let labeled = label_records(&table(&[
            "1,30,Male,2020-01-01,8,7,SSRI",
            "2,41,Female,2019-05-03,,20,None",
            "3,52,Female,2022-11-30,12,12,SNRI",
        ]))
        .unwrap();

        let summary = labeled.summary();
        assert_eq!(summary.labeled_rows, 2);
        assert_eq!(summary.excluded_rows, 1);
        assert_eq!(summary.severity_counts, [1, 1, 0]);
        assert_eq!(summary.first_diagnosis, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(summary.last_diagnosis, NaiveDate::from_ymd_opt(2022, 11, 30));
    }

    #[test]
    fn non_integer_score_is_rejected() {
        let err = label_records(&table(&["1,30,Male,2020-01-01,8.5,7,SSRI"])).unwrap_err();
        match err {
            PipelineError::InvalidScore { column, row, value } => {
                assert_eq!(column, OBSESSIONS_SCORE);
                assert_eq!(row, 1);
                assert_eq!(value, "8.5");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        for (obsessions, compulsions, bad) in [
            ("9223372036854775807", "1", "9223372036854775807"),
            ("1e300", "4", "1e300"),
            ("21", "0", "21"),
            ("-1", "3", "-1"),
        ] {
            let row = format!("1,30,Male,2020-01-01,{obsessions},{compulsions},SSRI");
            match label_records(&table(&[row.as_str()])) {
                Err(PipelineError::InvalidScore { value, .. }) => assert_eq!(value, bad),
                other => panic!("expected InvalidScore for {bad}, got {other:?}"),
            }
        }

        let labeled = label_records(&table(&["1,30,Male,2020-01-01,20.0,20,SSRI"])).unwrap();
        assert_eq!(labeled.severity(), &[Severity::Severe]);
        assert_eq!(Severity::from_scores(i64::MAX, 1), Severity::Severe);
    }

    #[test]
    fn empty_numeric_feature_is_missing_value() {
        let err = label_records(&table(&[
            "1,30,Male,2020-01-01,8,7,SSRI",
            "2,,Female,2021-05-03,20,20,None",
        ]))
        .unwrap_err();
        assert!(matches!(err, PipelineError::MissingValue { row: 2, .. }));
    }
}
