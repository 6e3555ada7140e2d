//! Classification metrics
//!
//! Accuracy, confusion matrix, per-class precision/recall/F1 and the
//! fixed-width classification report. A ratio with a zero denominator is 0.

use std::fmt;

use serde::Serialize;

/// Fraction of positions where prediction equals truth (0 for no rows)
#[must_use]
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Counts of (actual, predicted) pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Tally predictions; rows are actual classes, columns predicted classes
    ///
    /// Pairs with a code outside `0..n_classes` are ignored.
    #[must_use]
    pub fn new(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Self {
        let mut counts = vec![vec![0; n_classes]; n_classes];
        for (&actual, &predicted) in y_true.iter().zip(y_pred) {
            if actual < n_classes && predicted < n_classes {
                counts[actual][predicted] += 1;
            }
        }
        Self { counts }
    }

    /// Number of classes
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    /// Count for one cell
    #[must_use]
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual][predicted]
    }

    /// Rows of counts
    #[must_use]
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.counts
    }

    /// Sum of all cells
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Sum of the diagonal
    #[must_use]
    pub fn trace(&self) -> usize {
        (0..self.n_classes()).map(|k| self.counts[k][k]).sum()
    }

    /// Largest cell
    #[must_use]
    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Diagonal over total
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.trace() as f64, self.total() as f64)
    }

    /// Rows of class `k`
    #[must_use]
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Rows predicted as class `k`
    #[must_use]
    pub fn predicted(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    /// Precision, recall and F1 of one class
    #[must_use]
    pub fn class_scores(&self, class: usize) -> (f64, f64, f64) {
        let tp = self.counts[class][class] as f64;
        let precision = ratio(tp, self.predicted(class) as f64);
        let recall = ratio(tp, self.support(class) as f64);
        let f1 = ratio(2.0 * precision * recall, precision + recall);
        (precision, recall, f1)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Confusion matrix with actual classes as rows
#[must_use]
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> ConfusionMatrix {
    ConfusionMatrix::new(y_true, y_pred, n_classes)
}

/// `(precision, recall, f1)` for every class code in `0..n_classes`
#[must_use]
pub fn precision_recall_f1(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Vec<(f64, f64, f64)> {
    let matrix = ConfusionMatrix::new(y_true, y_pred, n_classes);
    (0..n_classes).map(|k| matrix.class_scores(k)).collect()
}

/// Unweighted mean F1 over the classes present in either vector
#[must_use]
pub fn f1_macro(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> f64 {
    let matrix = ConfusionMatrix::new(y_true, y_pred, n_classes);
    let present: Vec<usize> = (0..n_classes)
        .filter(|&k| matrix.support(k) > 0 || matrix.predicted(k) > 0)
        .collect();
    if present.is_empty() {
        return 0.0;
    }
    present.iter().map(|&k| matrix.class_scores(k).2).sum::<f64>() / present.len() as f64
}

/// Scores of one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// Class name
    pub label: String,
    /// Correct among predicted
    pub precision: f64,
    /// Correct among actual
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// Actual rows of the class
    pub support: usize,
}

/// Averaged scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageMetrics {
    /// Average precision
    pub precision: f64,
    /// Average recall
    pub recall: f64,
    /// Average F1
    pub f1: f64,
}

/// Per-class table plus overall accuracy and averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// One entry per class, in code order
    pub classes: Vec<ClassMetrics>,
    /// Overall accuracy
    pub accuracy: f64,
    /// Unweighted mean over classes
    pub macro_avg: AverageMetrics,
    /// Support-weighted mean over classes
    pub weighted_avg: AverageMetrics,
    /// Total rows
    pub support: usize,
}

impl ClassificationReport {
    /// Build the report; `class_names[k]` names class code `k`
    #[must_use]
    pub fn new(y_true: &[usize], y_pred: &[usize], class_names: &[String]) -> Self {
        let matrix = ConfusionMatrix::new(y_true, y_pred, class_names.len());
        Self::from_confusion(&matrix, class_names)
    }

    /// Build the report from an existing confusion matrix
    #[must_use]
    pub fn from_confusion(matrix: &ConfusionMatrix, class_names: &[String]) -> Self {
        let classes: Vec<ClassMetrics> = class_names
            .iter()
            .enumerate()
            .map(|(k, name)| {
                let (precision, recall, f1) = matrix.class_scores(k);
                ClassMetrics {
                    label: name.clone(),
                    precision,
                    recall,
                    f1,
                    support: matrix.support(k),
                }
            })
            .collect();

        let support = matrix.total();
        let n = classes.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
        };
        let weighted = |value: fn(&ClassMetrics) -> f64| {
            ratio(
                classes.iter().map(|c| value(c) * c.support as f64).sum(),
                support as f64,
            )
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Self {
            accuracy: matrix.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
            support,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["Mild".into(), "Moderate".into(), "Severe".into()]
    }

    #[test]
    fn accuracy_matches_confusion_diagonal() {
        let y_true = [0, 0, 1, 1, 2, 2, 2];
        let y_pred = [0, 1, 1, 1, 2, 0, 2];
        let matrix = ConfusionMatrix::new(&y_true, &y_pred, 3);
        assert_eq!(matrix.total(), 7);
        assert_eq!(matrix.trace(), 5);
        assert!((accuracy(&y_true, &y_pred) - 5.0 / 7.0).abs() < 1e-12);
        assert!((matrix.accuracy() - accuracy(&y_true, &y_pred)).abs() < 1e-12);
        assert_eq!(matrix.get(2, 0), 1);
        assert_eq!(matrix.get(0, 1), 1);
    }

    #[test]
    fn zero_division_scores_zero() {
        // class 2 is never predicted and never present
        let scores = precision_recall_f1(&[0, 1, 1], &[0, 1, 0], 3);
        assert_eq!(scores[2], (0.0, 0.0, 0.0));
        assert!((scores[0].0 - 0.5).abs() < 1e-12);
        assert_eq!(confusion_matrix(&[0, 1, 1], &[0, 1, 0], 3).get(1, 0), 1);
    }

    #[test]
    fn per_class_scores() {
        let y_true = [0, 0, 1, 1, 2, 2, 2];
        let y_pred = [0, 1, 1, 1, 2, 0, 2];
        let report = ClassificationReport::new(&y_true, &y_pred, &names());

        let mild = &report.classes[0];
        assert!((mild.precision - 0.5).abs() < 1e-12);
        assert!((mild.recall - 0.5).abs() < 1e-12);
        assert_eq!(mild.support, 2);

        let moderate = &report.classes[1];
        assert!((moderate.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((moderate.recall - 1.0).abs() < 1e-12);
        assert!((moderate.f1 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn zero_division_is_zero() {
        let report = ClassificationReport::new(&[0, 0], &[0, 0], &names());
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
        assert_eq!(report.classes[2].support, 0);
    }

    #[test]
    fn macro_f1_ignores_absent_classes() {
        // Class 2 never appears, so only classes 0 and 1 are averaged
        let score = f1_macro(&[0, 1, 1, 0], &[0, 1, 1, 0], 3);
        assert!((score - 1.0).abs() < 1e-12);

        let score = f1_macro(&[0, 0, 1, 1], &[0, 0, 0, 1], 2);
        // class 0: p=2/3 r=1 f1=0.8; class 1: p=1 r=0.5 f1=2/3
        assert!((score - (0.8 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn report_renders_fixed_width_table() {
        let report = ClassificationReport::new(&[0, 1, 2, 2], &[0, 1, 2, 1], &names());
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "              precision    recall  f1-score   support");
        assert_eq!(lines[2], "        Mild       1.00      1.00      1.00         1");
        assert_eq!(lines[6], "    accuracy                           0.75         4");
        assert!(lines[7].starts_with("   macro avg"));
        assert!(lines[8].starts_with("weighted avg"));
    }
}
