use std::path::{Path, PathBuf};

use ocd_severity::{ParamGrid, PipelineConfig, RawTable, Result};
use rand::prelude::*;
use rand::rngs::StdRng;

/// Header of the synthetic patient file
pub const HEADERS: [&str; 13] = [
    "Patient ID",
    "Age",
    "Gender",
    "Ethnicity",
    "Marital Status",
    "OCD Diagnosis Date",
    "Duration of Symptoms (months)",
    "Family History of OCD",
    "Obsession Type",
    "Compulsion Type",
    "Y-BOCS Score (Obsessions)",
    "Y-BOCS Score (Compulsions)",
    "Medications",
];

const GENDERS: [&str; 2] = ["Female", "Male"];
const ETHNICITIES: [&str; 4] = ["African", "Asian", "Caucasian", "Hispanic"];
const MARITAL: [&str; 3] = ["Divorced", "Married", "Single"];
const OBSESSIONS: [&str; 4] = ["Contamination", "Harm-related", "Religious", "Symmetry"];
const COMPULSIONS: [&str; 4] = ["Checking", "Counting", "Ordering", "Washing"];
const MEDICATIONS: [&str; 4] = ["Benzodiazepine", "None", "SNRI", "SSRI"];

/// Deterministic patient rows whose severity is reflected in the symptom duration
#[must_use]
pub fn synthetic_rows(n: usize, seed: u64) -> Vec<Vec<String>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let obsessions: i64 = rng.random_range(0..=20);
            let compulsions: i64 = rng.random_range(0..=20);
            let total = obsessions + compulsions;
            let duration = total * 6 + rng.random_range(0..12);
            let month = rng.random_range(1..=12);
            let day = rng.random_range(1..=28);
            vec![
                (1000 + i).to_string(),
                rng.random_range(18..75).to_string(),
                GENDERS.choose(&mut rng).copied().unwrap_or("Female").to_string(),
                ETHNICITIES.choose(&mut rng).copied().unwrap_or("Asian").to_string(),
                MARITAL.choose(&mut rng).copied().unwrap_or("Single").to_string(),
                format!("20{:02}-{month:02}-{day:02}", 15 + i % 8),
                duration.to_string(),
                if total > 25 { "Yes" } else { "No" }.to_string(),
                OBSESSIONS.choose(&mut rng).copied().unwrap_or("Symmetry").to_string(),
                COMPULSIONS.choose(&mut rng).copied().unwrap_or("Checking").to_string(),
                obsessions.to_string(),
                compulsions.to_string(),
                MEDICATIONS.choose(&mut rng).copied().unwrap_or("None").to_string(),
            ]
        })
        .collect()
}

/// In-memory table of synthetic patients
pub fn synthetic_table(n: usize, seed: u64) -> Result<RawTable> {
    RawTable::new(
        HEADERS.iter().map(ToString::to_string).collect(),
        synthetic_rows(n, seed),
    )
}

/// Write rows under `headers` to `dir/name`
pub fn write_csv(dir: &Path, name: &str, headers: &[&str], rows: &[Vec<String>]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = csv::Writer::from_path(&path).expect("create csv");
    writer.write_record(headers).expect("write header");
    for row in rows {
        writer.write_record(row).expect("write row");
    }
    writer.flush().expect("flush csv");
    path
}

/// Write a synthetic patient file of `n` rows
pub fn write_synthetic_csv(dir: &Path, n: usize, seed: u64) -> PathBuf {
    write_csv(dir, "OCD.csv", &HEADERS, &synthetic_rows(n, seed))
}

/// Grid small enough for quick test runs
#[must_use]
pub fn small_grid() -> ParamGrid {
    ParamGrid {
        n_estimators: vec![10],
        max_depth: vec![2, 3],
        learning_rate: vec![0.3],
        subsample: vec![0.9],
        colsample_bytree: vec![1.0],
    }
}

/// Quiet configuration for a test run on `path`
pub fn test_config(path: &Path) -> Result<PipelineConfig> {
    PipelineConfig::builder()
        .input_path(path)
        .param_grid(small_grid())
        .cv_folds(3)
        .show_progress(false)
        .build()
}
