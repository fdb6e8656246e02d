//! Evaluation metrics: per-class precision/recall/F1 and the printed
//! classification report

use core::fmt;
use serde::{Deserialize, Serialize};
use tsc_core::{TscError, TscResult};

/// Metrics for a single class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: usize,
}

/// Precision/recall/F1 aggregate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

/// Full evaluation report over a held-out set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f32,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
    pub total_support: usize,
}

/// Compute the classification report for predicted vs. true labels over
/// the declared class set.
///
/// Fails with `LabelMismatch` when the slices differ in length or any
/// label falls outside `classes`. Predictions covering only a subset of
/// the classes are legal.
pub fn classification_report(
    y_true: &[String],
    y_pred: &[String],
    classes: &[String],
) -> TscResult<ClassificationReport> {
    if y_true.len() != y_pred.len() {
        return Err(TscError::LabelMismatch {
            reason: format!(
                "{} true labels vs {} predictions",
                y_true.len(),
                y_pred.len()
            ),
        });
    }
    if y_true.is_empty() {
        return Err(TscError::LabelMismatch {
            reason: "no labels to evaluate".to_string(),
        });
    }
    if classes.is_empty() {
        return Err(TscError::LabelMismatch {
            reason: "declared class set is empty".to_string(),
        });
    }

    let index_of = |label: &String, kind: &str| -> TscResult<usize> {
        classes.iter().position(|c| c == label).ok_or_else(|| {
            TscError::LabelMismatch {
                reason: format!("{} label '{}' is not in the class set", kind, label),
            }
        })
    };

    let n = classes.len();
    let mut tp = vec![0usize; n];
    let mut fp = vec![0usize; n];
    let mut fn_ = vec![0usize; n];
    let mut support = vec![0usize; n];
    let mut correct = 0usize;

    for (truth, pred) in y_true.iter().zip(y_pred.iter()) {
        let t = index_of(truth, "true")?;
        let p = index_of(pred, "predicted")?;
        support[t] += 1;
        if t == p {
            tp[t] += 1;
            correct += 1;
        } else {
            fn_[t] += 1;
            fp[p] += 1;
        }
    }

    let total_support = y_true.len();
    let mut per_class = Vec::with_capacity(n);
    for (idx, label) in classes.iter().enumerate() {
        let precision = ratio(tp[idx], tp[idx] + fp[idx]);
        let recall = ratio(tp[idx], tp[idx] + fn_[idx]);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        per_class.push(ClassMetrics {
            label: label.clone(),
            precision,
            recall,
            f1,
            support: support[idx],
        });
    }

    let macro_avg = Averages {
        precision: per_class.iter().map(|c| c.precision).sum::<f32>() / n as f32,
        recall: per_class.iter().map(|c| c.recall).sum::<f32>() / n as f32,
        f1: per_class.iter().map(|c| c.f1).sum::<f32>() / n as f32,
    };

    let weighted = |metric: fn(&ClassMetrics) -> f32| -> f32 {
        per_class
            .iter()
            .map(|c| metric(c) * c.support as f32)
            .sum::<f32>()
            / total_support as f32
    };
    let weighted_avg = Averages {
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1: weighted(|c| c.f1),
    };

    Ok(ClassificationReport {
        per_class,
        accuracy: correct as f32 / total_support as f32,
        macro_avg,
        weighted_avg,
        total_support,
    })
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self
            .per_class
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            width = label_width
        )?;
        writeln!(f)?;

        for class in &self.per_class {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
                class.label,
                class.precision,
                class.recall,
                class.f1,
                class.support,
                width = label_width
            )?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9.2}  {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support,
            width = label_width
        )?;
        writeln!(
            f,
            "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
            "macro avg",
            self.macro_avg.precision,
            self.macro_avg.recall,
            self.macro_avg.f1,
            self.total_support,
            width = label_width
        )?;
        writeln!(
            f,
            "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
            "weighted avg",
            self.weighted_avg.precision,
            self.weighted_avg.recall,
            self.weighted_avg.f1,
            self.total_support,
            width = label_width
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(groups: &[(&str, usize)]) -> Vec<String> {
        let mut out = Vec::new();
        for (label, count) in groups {
            for _ in 0..*count {
                out.push(label.to_string());
            }
        }
        out
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = labels(&[("0", 10), ("1", 5)]);
        let classes = vec!["0".to_string(), "1".to_string()];
        let report = classification_report(&truth, &truth, &classes).unwrap();

        assert_eq!(report.accuracy, 1.0);
        for class in &report.per_class {
            assert_eq!(class.precision, 1.0);
            assert_eq!(class.recall, 1.0);
            assert_eq!(class.f1, 1.0);
        }
    }

    /// Reproduces the documented imbalanced report: 1005 negatives and
    /// 995 positives, everything predicted positive.
    #[test]
    fn test_documented_imbalanced_report() {
        let truth = labels(&[("0", 1005), ("1", 995)]);
        let preds = labels(&[("1", 2000)]);
        let classes = vec!["0".to_string(), "1".to_string()];

        let report = classification_report(&truth, &preds, &classes).unwrap();

        let zero = &report.per_class[0];
        assert_eq!(zero.precision, 0.0);
        assert_eq!(zero.recall, 0.0);
        assert_eq!(zero.f1, 0.0);
        assert_eq!(zero.support, 1005);

        let one = &report.per_class[1];
        assert!((one.precision - 995.0 / 2000.0).abs() < 1e-6);
        assert_eq!(one.recall, 1.0);
        assert!((one.f1 - 0.6644).abs() < 1e-3);
        assert_eq!(one.support, 995);

        assert!((report.accuracy - 0.4975).abs() < 1e-6);
        assert_eq!(report.total_support, 2000);

        // Two-decimal rendering matches the documented table
        let printed = report.to_string();
        assert!(printed.contains("0.50"));
        assert!(printed.contains("1.00"));
        assert!(printed.contains("0.66"));
        assert!(printed.contains("1005"));
        assert!(printed.contains("995"));
        assert!(printed.contains("2000"));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let truth = labels(&[("0", 3)]);
        let preds = labels(&[("0", 2)]);
        let classes = vec!["0".to_string()];

        let result = classification_report(&truth, &preds, &classes);
        assert!(matches!(result, Err(TscError::LabelMismatch { .. })));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let truth = labels(&[("0", 2)]);
        let preds = labels(&[("2", 2)]);
        let classes = vec!["0".to_string(), "1".to_string()];

        let result = classification_report(&truth, &preds, &classes);
        assert!(matches!(result, Err(TscError::LabelMismatch { .. })));
    }

    #[test]
    fn test_macro_and_weighted_averages() {
        // 4 of class a (all right), 2 of class b (all wrong, predicted a)
        let truth = labels(&[("a", 4), ("b", 2)]);
        let preds = labels(&[("a", 6)]);
        let classes = vec!["a".to_string(), "b".to_string()];

        let report = classification_report(&truth, &preds, &classes).unwrap();

        // a: precision 4/6, recall 1; b: 0, 0
        assert!((report.macro_avg.recall - 0.5).abs() < 1e-6);
        assert!((report.macro_avg.precision - (4.0 / 6.0) / 2.0).abs() < 1e-6);
        assert!((report.weighted_avg.recall - 4.0 / 6.0).abs() < 1e-6);
        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-6);
    }
}
