use std::path::Path;

use crate::utils::{HEADERS, synthetic_rows, test_config, write_csv};
use ocd_severity::{Pipeline, PipelineError, load_csv};

/// A file missing a required column is rejected before any modelling
#[test]
fn test_missing_column_is_reported() -> ocd_severity::Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let headers: Vec<&str> = HEADERS
        .iter()
        .copied()
        .filter(|h| *h != "Y-BOCS Score (Compulsions)")
        .collect();
    let rows: Vec<Vec<String>> = synthetic_rows(30, 1)
        .into_iter()
        .map(|mut row| {
            row.remove(11);
            row
        })
        .collect();
    let path = write_csv(dir.path(), "partial.csv", &headers, &rows);

    match Pipeline::new(test_config(&path)?).run() {
        Err(PipelineError::MissingColumn(column)) => {
            assert_eq!(column, "Y-BOCS Score (Compulsions)");
        }
        other => panic!("expected a missing-column error, got {other:?}"),
    }
    Ok(())
}

/// A missing input file surfaces as an I/O error naming the path
#[test]
fn test_missing_file_is_reported() -> ocd_severity::Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.csv");

    match Pipeline::new(test_config(&path)?).run() {
        Err(PipelineError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
    Ok(())
}

/// Header-only files contain nothing to model
#[test]
fn test_header_only_file_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(dir.path(), "empty.csv", &HEADERS, &[]);
    assert!(matches!(load_csv(&path), Err(PipelineError::EmptyDataset(_))));
}

/// A fractional sub-score is not a valid Y-BOCS score
#[test]
fn test_fractional_score_is_rejected() -> ocd_severity::Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut rows = synthetic_rows(30, 2);
    rows[4][10] = "7.5".to_string();
    let path = write_csv(dir.path(), "fractional.csv", &HEADERS, &rows);

    let result = Pipeline::new(test_config(&path)?).run();
    assert!(matches!(result, Err(PipelineError::InvalidScore { .. })));
    Ok(())
}

/// Loading reads every data row and keeps the header order
#[test]
fn test_load_keeps_all_rows() -> ocd_severity::Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(dir.path(), "OCD.csv", &HEADERS, &synthetic_rows(25, 9));
    let table = load_csv(Path::new(&path))?;
    assert_eq!(table.n_rows(), 25);
    assert_eq!(table.headers(), HEADERS.map(String::from).as_slice());
    Ok(())
}
