use std::collections::BTreeSet;

use crate::utils::{synthetic_table, test_config, write_synthetic_csv};
use ocd_severity::{Pipeline, PipelineConfig, Severity};

/// Full run on a file: accuracy, partition and report agree with each other
#[test]
fn test_pipeline_end_to_end() -> ocd_severity::Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_synthetic_csv(dir.path(), 200, 7);
    let outcome = Pipeline::new(test_config(&path)?).run()?;

    let n = outcome.summary.cohort.labeled_rows;
    assert_eq!(n, 200);

    // accuracy is recomputable from the confusion matrix
    let expected = outcome.confusion.trace() as f64 / outcome.confusion.total() as f64;
    assert!((outcome.accuracy - expected).abs() < 1e-12);
    assert!((outcome.report.accuracy - outcome.accuracy).abs() < 1e-12);

    // train and test partition the labelled rows
    let train: BTreeSet<usize> = outcome.split.train.iter().copied().collect();
    let test: BTreeSet<usize> = outcome.split.test.iter().copied().collect();
    assert!(train.is_disjoint(&test));
    assert_eq!(train.len() + test.len(), n);
    assert_eq!(test.len(), 40);
    assert_eq!(outcome.confusion.total(), test.len());
    assert_eq!(outcome.predictions.len(), test.len());

    let names: Vec<&str> = outcome.heatmap.labels().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["Mild", "Moderate", "Severe"]);
    assert_eq!(outcome.report.support, test.len());
    assert_eq!(outcome.summary.candidates.len(), 2);
    assert!(
        outcome
            .summary
            .candidates
            .iter()
            .any(|c| c.params == outcome.best_params && c.rank == 1)
    );

    // resampling balanced the training classes
    let stats = &outcome.summary.resample;
    assert_eq!(stats.counts_before.iter().sum::<usize>(), train.len());
    assert!(stats.synthetic_rows > 0);

    println!("Best Accuracy: {}", outcome.accuracy);
    println!("{}", outcome.report);
    Ok(())
}

/// Same seed, same input: identical split, model choice and scores
#[test]
fn test_pipeline_is_deterministic() -> ocd_severity::Result<()> {
    let run = |jobs: usize| -> ocd_severity::Result<_> {
        let config = PipelineConfig::builder()
            .param_grid(crate::utils::small_grid())
            .cv_folds(3)
            .n_jobs(jobs)
            .show_progress(false)
            .build()?;
        Pipeline::new(config).run_on_table(synthetic_table(150, 11)?)
    };

    let first = run(1)?;
    let second = run(4)?;

    assert_eq!(first.split, second.split);
    assert_eq!(first.best_params, second.best_params);
    assert_eq!(first.predictions, second.predictions);
    assert_eq!(first.confusion, second.confusion);
    assert_eq!(first.summary.resample, second.summary.resample);
    assert_eq!(first.summary.candidates, second.summary.candidates);
    assert!((first.accuracy - second.accuracy).abs() < f64::EPSILON);
    Ok(())
}

/// Rows with an empty sub-score are left out and counted
#[test]
fn test_rows_with_missing_scores_are_excluded() -> ocd_severity::Result<()> {
    let mut rows = crate::utils::synthetic_rows(120, 3);
    rows[5][10].clear();
    rows[17][11].clear();
    let table = ocd_severity::RawTable::new(
        crate::utils::HEADERS.iter().map(ToString::to_string).collect(),
        rows,
    )?;

    let config = PipelineConfig::builder()
        .param_grid(crate::utils::small_grid())
        .cv_folds(3)
        .show_progress(false)
        .build()?;
    let outcome = Pipeline::new(config).run_on_table(table)?;

    let cohort = &outcome.summary.cohort;
    assert_eq!(cohort.excluded_rows, 2);
    assert_eq!(cohort.labeled_rows, 118);
    assert_eq!(cohort.severity_counts.iter().sum::<usize>(), 118);
    assert_eq!(outcome.split.train.len() + outcome.split.test.len(), 118);
    assert!(outcome.summary.input_path.is_none());
    assert!(cohort.first_diagnosis <= cohort.last_diagnosis);
    Ok(())
}

/// Severity bands match the published Y-BOCS cut-offs
#[test]
fn test_severity_bands() {
    assert_eq!(Severity::from_scores(8, 7), Severity::Mild);
    assert_eq!(Severity::from_scores(8, 8), Severity::Moderate);
    assert_eq!(Severity::from_scores(13, 12), Severity::Moderate);
    assert_eq!(Severity::from_scores(13, 13), Severity::Severe);
}

/// A severity band with a single patient cannot be stratified and is named in the error
#[test]
fn test_singleton_band_is_named() -> ocd_severity::Result<()> {
    let mut rows = crate::utils::synthetic_rows(60, 4);
    for (i, row) in rows.iter_mut().enumerate() {
        let score = if i == 0 { "20" } else if i % 2 == 0 { "5" } else { "10" };
        row[10] = score.to_string();
        row[11] = score.to_string();
    }
    let table = ocd_severity::RawTable::new(
        crate::utils::HEADERS.iter().map(ToString::to_string).collect(),
        rows,
    )?;

    let config = PipelineConfig::builder()
        .param_grid(crate::utils::small_grid())
        .cv_folds(3)
        .show_progress(false)
        .build()?;
    match Pipeline::new(config).run_on_table(table) {
        Err(ocd_severity::PipelineError::DegenerateClass(message)) => {
            assert!(message.contains("Severe"), "{message}");
        }
        other => panic!("expected a degenerate-class error, got {other:?}"),
    }
    Ok(())
}
