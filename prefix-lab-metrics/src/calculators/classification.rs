use prefix_lab_core::{CoreError, MetricCalculator, Metrics, Result};
use serde::{Deserialize, Serialize};

use super::LabelInput;

/// Per-class precision, recall and F1 with the class's support.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Scores single-label predictions over a fixed set of classes.
///
/// Precision, recall and F1 are computed per class and averaged with weights
/// proportional to each class's support in the true labels. A class with no
/// predicted (or no true) members contributes 0 instead of dividing by zero.
#[derive(Debug, Clone)]
pub struct ClassificationCalculator {
    n_classes: usize,
}

impl ClassificationCalculator {
    pub fn new(n_classes: usize) -> Self {
        Self { n_classes }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Rows are true labels, columns are predictions, both in ascending index.
    pub fn confusion_matrix(&self, predicted: &[usize], actual: &[usize]) -> Result<Vec<Vec<u64>>> {
        let mut matrix = vec![vec![0u64; self.n_classes]; self.n_classes];
        for (&p, &t) in predicted.iter().zip(actual) {
            if p >= self.n_classes || t >= self.n_classes {
                return Err(CoreError::Validation(format!(
                    "label pair ({}, {}) outside {} classes",
                    t, p, self.n_classes
                )));
            }
            matrix[t][p] += 1;
        }
        Ok(matrix)
    }

    pub fn class_scores(matrix: &[Vec<u64>]) -> Vec<ClassScores> {
        let n = matrix.len();
        (0..n)
            .map(|class| {
                let tp = matrix[class][class];
                let support: u64 = matrix[class].iter().sum();
                let predicted: u64 = matrix.iter().map(|row| row[class]).sum();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassScores {
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl MetricCalculator for ClassificationCalculator {
    type Input = LabelInput;
    type Output = Metrics;

    fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        if input.predicted.len() != input.actual.len() {
            return Err(CoreError::Validation(format!(
                "{} predictions for {} true labels",
                input.predicted.len(),
                input.actual.len()
            )));
        }

        let matrix = self.confusion_matrix(&input.predicted, &input.actual)?;
        let scores = Self::class_scores(&matrix);
        let total: u64 = scores.iter().map(|s| s.support).sum();

        let correct = input
            .predicted
            .iter()
            .zip(&input.actual)
            .filter(|(p, t)| p == t)
            .count() as u64;

        let weighted = |pick: fn(&ClassScores) -> f64| -> f64 {
            if total == 0 {
                return 0.0;
            }
            scores
                .iter()
                .map(|s| pick(s) * s.support as f64)
                .sum::<f64>()
                / total as f64
        };

        Ok(Metrics {
            accuracy: ratio(correct, input.actual.len() as u64),
            precision: weighted(|s| s.precision),
            recall: weighted(|s| s.recall),
            f1_score: weighted(|s| s.f1),
            confusion_matrix: matrix,
            predictions: input.predicted,
            true_labels: input.actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let calc = ClassificationCalculator::new(2);
        let m = calc
            .calculate(LabelInput::new(vec![0, 1, 1, 0], vec![0, 1, 1, 0]))
            .unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
        assert_eq!(m.confusion_matrix, vec![vec![2, 0], vec![0, 2]]);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let calc = ClassificationCalculator::new(2);
        assert!(calc.calculate(LabelInput::new(vec![0], vec![0, 1])).is_err());
    }

    #[test]
    fn test_out_of_range_label_is_error() {
        let calc = ClassificationCalculator::new(2);
        assert!(calc.calculate(LabelInput::new(vec![2], vec![0])).is_err());
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let calc = ClassificationCalculator::new(3);
        let m = calc.calculate(LabelInput::new(vec![], vec![])).unwrap();
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_eq!(m.total(), 0);
    }
}
