use serde::{Deserialize, Serialize};

/// Scores of one trained classifier on a held-out split.
///
/// `confusion_matrix[t][p]` counts documents with true label `t` predicted as
/// `p`; its entries sum to `true_labels.len()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: Vec<Vec<u64>>,
    pub predictions: Vec<usize>,
    pub true_labels: Vec<usize>,
}

impl Metrics {
    pub fn total(&self) -> u64 {
        self.confusion_matrix.iter().flatten().sum()
    }

    /// Per-class true counts.
    pub fn row_sums(&self) -> Vec<u64> {
        self.confusion_matrix.iter().map(|row| row.iter().sum()).collect()
    }

    /// Per-class predicted counts.
    pub fn column_sums(&self) -> Vec<u64> {
        let n = self.confusion_matrix.len();
        (0..n)
            .map(|col| self.confusion_matrix.iter().map(|row| row[col]).sum())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metrics {
        Metrics {
            accuracy: 0.75,
            precision: 0.75,
            recall: 0.75,
            f1_score: 0.75,
            confusion_matrix: vec![vec![2, 1], vec![0, 1]],
            predictions: vec![0, 0, 1, 1],
            true_labels: vec![0, 0, 0, 1],
        }
    }

    #[test]
    fn test_sums() {
        let m = sample();
        assert_eq!(m.total(), 4);
        assert_eq!(m.row_sums(), vec![3, 1]);
        assert_eq!(m.column_sums(), vec![2, 2]);
    }
}
