//! Stratified partitioning of labelled rows
//!
//! Both the train/test split and the cross-validation folds keep every class's
//! share of rows as even as integer counts allow. Shuffling uses a seeded
//! `StdRng`, so the same seed always yields the same partition.

use log::{info, warn};
use rand::prelude::*;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Row indices of the training and test partitions, each in ascending order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainTestSplit {
    /// Training rows
    pub train: Vec<usize>,
    /// Held-out rows
    pub test: Vec<usize>,
}

/// One cross-validation fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Rows used for fitting
    pub train: Vec<usize>,
    /// Rows used for scoring
    pub validation: Vec<usize>,
}

/// Rows of each class, indexed by class code
fn rows_by_class(labels: &[usize]) -> Vec<Vec<usize>> {
    let n_classes = labels.iter().max().map_or(0, |&max| max + 1);
    let mut by_class = vec![Vec::new(); n_classes];
    for (row, &label) in labels.iter().enumerate() {
        by_class[label].push(row);
    }
    by_class
}

/// Split rows into train and test sets preserving class proportions
///
/// The test set receives `ceil(test_fraction * n)` rows. Each class gets the
/// floor of its proportional share; leftover rows go to the classes with the
/// largest fractional remainders (ties to the larger class, then the lower code).
pub fn stratified_train_test_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    stratified_train_test_split_named(labels, &[], test_fraction, seed)
}

/// [`stratified_train_test_split`] with `class_names[k]` naming class `k` in errors
pub fn stratified_train_test_split_named(
    labels: &[usize],
    class_names: &[&str],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    let describe = |class: usize| {
        class_names
            .get(class)
            .map_or_else(|| format!("class {class}"), |name| format!("class '{name}'"))
    };

    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "test fraction must lie in (0, 1), got {test_fraction}"
        )));
    }

    let n = labels.len();
    let by_class = rows_by_class(labels);
    let populated: Vec<usize> = (0..by_class.len()).filter(|&c| !by_class[c].is_empty()).collect();

    if populated.len() < 2 {
        return Err(PipelineError::DegenerateClass(format!(
            "stratified split needs at least 2 classes, found {}",
            populated.len()
        )));
    }
    if let Some(&class) = populated.iter().find(|&&c| by_class[c].len() < 2) {
        return Err(PipelineError::DegenerateClass(format!(
            "{} has a single row; stratified splitting needs at least 2",
            describe(class)
        )));
    }

    let n_test = ((test_fraction * n as f64).ceil() as usize).clamp(populated.len(), n - populated.len());
    let test_counts = allocate_proportionally(&by_class, n, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);

    for (class_rows, &count) in by_class.iter().zip(&test_counts) {
        let mut shuffled = class_rows.clone();
        shuffled.shuffle(&mut rng);
        test.extend_from_slice(&shuffled[..count]);
        train.extend_from_slice(&shuffled[count..]);
    }

    train.sort_unstable();
    test.sort_unstable();

    info!(
        "Stratified split: {} training rows, {} test rows",
        train.len(),
        test.len()
    );
    Ok(TrainTestSplit { train, test })
}

/// Distribute `total` draws over the classes in proportion to their sizes
fn allocate_proportionally(by_class: &[Vec<usize>], n: usize, total: usize) -> Vec<usize> {
    let exact: Vec<f64> = by_class
        .iter()
        .map(|rows| rows.len() as f64 * total as f64 / n as f64)
        .collect();
    let mut counts: Vec<usize> = exact.iter().map(|v| v.floor() as usize).collect();

    let mut order: Vec<usize> = (0..by_class.len()).collect();
    order.sort_by(|&a, &b| {
        let rem_a = exact[a] - exact[a].floor();
        let rem_b = exact[b] - exact[b].floor();
        rem_b
            .total_cmp(&rem_a)
            .then(by_class[b].len().cmp(&by_class[a].len()))
            .then(a.cmp(&b))
    });

    let mut remaining = total - counts.iter().sum::<usize>();
    for class in order.into_iter().cycle() {
        if remaining == 0 {
            break;
        }
        // Every class keeps at least one training row
        if counts[class] + 1 < by_class[class].len() {
            counts[class] += 1;
            remaining -= 1;
        }
    }
    counts
}

/// Build `k` stratified folds
///
/// Each class's shuffled rows are dealt round-robin over the folds, starting
/// at the fold after the one that received the previous class's last row.
pub fn stratified_k_fold(labels: &[usize], k: usize, seed: u64) -> Result<Vec<Fold>> {
    let n = labels.len();
    if k < 2 {
        return Err(PipelineError::InvalidConfig(format!(
            "cross-validation needs at least 2 folds, got {k}"
        )));
    }
    if k > n {
        return Err(PipelineError::DegenerateClass(format!(
            "cannot build {k} folds from {n} rows"
        )));
    }

    let by_class = rows_by_class(labels);
    for (class, rows) in by_class.iter().enumerate() {
        if !rows.is_empty() && rows.len() < k {
            warn!(
                "Class {class} has only {} rows, fewer than the {k} folds",
                rows.len()
            );
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0usize; n];
    let mut next_fold = 0usize;

    for class_rows in &by_class {
        let mut shuffled = class_rows.clone();
        shuffled.shuffle(&mut rng);
        for row in shuffled {
            assignment[row] = next_fold;
            next_fold = (next_fold + 1) % k;
        }
    }

    let folds = (0..k)
        .map(|fold| {
            let (validation, train): (Vec<usize>, Vec<usize>) =
                (0..n).partition(|&row| assignment[row] == fold);
            Fold { train, validation }
        })
        .collect();
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(counts: &[usize]) -> Vec<usize> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(class, &count)| std::iter::repeat_n(class, count))
            .collect()
    }

    fn count(rows: &[usize], labels: &[usize], class: usize) -> usize {
        rows.iter().filter(|&&r| labels[r] == class).count()
    }

    #[test]
    fn split_partitions_every_row_once() {
        let y = labels(&[50, 30, 20]);
        let split = stratified_train_test_split(&y, 0.2, 42).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..y.len()).collect::<Vec<_>>());
        assert_eq!(split.test.len(), 20);
    }

    #[test]
    fn split_preserves_class_proportions() {
        let y = labels(&[47, 31, 19]);
        let split = stratified_train_test_split(&y, 0.2, 7).unwrap();
        let n = y.len() as f64;

        for (class, &size) in [47usize, 31, 19].iter().enumerate() {
            let expected_test = size as f64 * split.test.len() as f64 / n;
            let actual_test = count(&split.test, &y, class) as f64;
            assert!((expected_test - actual_test).abs() < 1.0, "class {class}");

            let expected_train = size as f64 * split.train.len() as f64 / n;
            let actual_train = count(&split.train, &y, class) as f64;
            assert!((expected_train - actual_train).abs() < 1.0, "class {class}");
        }
    }

    #[test]
    fn split_is_deterministic_for_a_seed() {
        let y = labels(&[40, 25, 10]);
        let a = stratified_train_test_split(&y, 0.2, 42).unwrap();
        let b = stratified_train_test_split(&y, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn split_rejects_singleton_class() {
        let y = labels(&[10, 1]);
        match stratified_train_test_split(&y, 0.2, 42) {
            Err(PipelineError::DegenerateClass(message)) => assert!(message.contains("class 1")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn singleton_class_error_uses_its_name() {
        let y = labels(&[10, 6, 1]);
        match stratified_train_test_split_named(&y, &["Mild", "Moderate", "Severe"], 0.2, 42) {
            Err(PipelineError::DegenerateClass(message)) => {
                assert!(message.contains("'Severe'"), "{message}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn folds_partition_rows_evenly() {
        let y = labels(&[23, 17, 11]);
        let folds = stratified_k_fold(&y, 5, 42).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.validation.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..y.len()).collect::<Vec<_>>());

        for class in 0..3 {
            let per_fold: Vec<usize> = folds.iter().map(|f| count(&f.validation, &y, class)).collect();
            let max = per_fold.iter().max().unwrap();
            let min = per_fold.iter().min().unwrap();
            assert!(max - min <= 1, "class {class}: {per_fold:?}");
        }

        let sizes: Vec<usize> = folds.iter().map(|f| f.validation.len()).collect();
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.validation.len(), y.len());
            assert!(fold.validation.iter().all(|r| !fold.train.contains(r)));
        }
    }

    #[test]
    fn folds_need_two_splits() {
        assert!(stratified_k_fold(&[0, 1, 0, 1], 1, 0).is_err());
    }
}
