//! CSV ingest for the patient table

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use log::debug;

use crate::data::table::RawTable;
use crate::error::util::open_input_file;
use crate::error::{PipelineError, Result};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Patient identifier column
pub const PATIENT_ID: &str = "Patient ID";
/// Diagnosis date column
pub const DIAGNOSIS_DATE: &str = "OCD Diagnosis Date";
/// Obsessions sub-score column
pub const OBSESSIONS_SCORE: &str = "Y-BOCS Score (Obsessions)";
/// Compulsions sub-score column
pub const COMPULSIONS_SCORE: &str = "Y-BOCS Score (Compulsions)";

/// Columns every input file must provide
pub const REQUIRED_COLUMNS: [&str; 4] =
    [PATIENT_ID, DIAGNOSIS_DATE, OBSESSIONS_SCORE, COMPULSIONS_SCORE];

/// Load the patient table from a CSV file
///
/// The file must have a header row containing every entry of
/// [`REQUIRED_COLUMNS`]; additional columns are kept as candidate features.
pub fn load_csv(path: &Path) -> Result<RawTable> {
    log_operation_start("Loading patient records from", path);
    let start = Instant::now();

    let file = open_input_file(path)?;
    let table = read_csv(file)?;

    log_operation_complete("loaded", path, table.n_rows(), Some(start.elapsed()));
    Ok(table)
}

/// Read and validate a patient table from any reader
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    debug!("CSV header: {headers:?}");

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let table = RawTable::new(headers, rows)?;
    table.require_columns(&REQUIRED_COLUMNS)?;

    if table.is_empty() {
        return Err(PipelineError::EmptyDataset(
            "input file has a header but no rows".to_string(),
        ));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Patient ID,Age,Gender,OCD Diagnosis Date,Y-BOCS Score (Obsessions),Y-BOCS Score (Compulsions)";

    #[test]
    fn reads_rows_and_trims_cells() {
        let input = format!("{HEADER}\n1, 30 ,Male,2020-01-01,8,7\n2,41,Female,2021-05-03,20,20\n");
        let table = read_csv(input.as_bytes()).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("Age").unwrap(), vec!["30", "41"]);
    }

    #[test]
    fn missing_required_column() {
        let input = "Patient ID,Age,OCD Diagnosis Date,Y-BOCS Score (Obsessions)\n1,30,2020-01-01,8\n";
        match read_csv(input.as_bytes()) {
            Err(PipelineError::MissingColumn(name)) => assert_eq!(name, COMPULSIONS_SCORE),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn header_only_is_empty() {
        let input = format!("{HEADER}\n");
        assert!(matches!(
            read_csv(input.as_bytes()),
            Err(PipelineError::EmptyDataset(_))
        ));
    }

    #[test]
    fn ragged_record_is_a_csv_error() {
        let input = format!("{HEADER}\n1,30,Male,2020-01-01,8\n");
        assert!(matches!(read_csv(input.as_bytes()), Err(PipelineError::Csv(_))));
    }
}
