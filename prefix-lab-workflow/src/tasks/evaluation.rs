use prefix_lab_core::{MetricCalculator, Metrics, ModelKind, Result};
use prefix_lab_metrics::{ClassificationCalculator, LabelInput};

use super::classifiers::build_classifier;
use super::vectorize::SparseMatrix;

/// Train a fresh `model_kind` classifier on the training split and score it
/// on the test split.
///
/// The confusion matrix is sized by `label_names`, so classes missing from
/// the test split still get a row and column.
pub fn train_and_evaluate(
    x_train: &SparseMatrix,
    x_test: &SparseMatrix,
    y_train: &[usize],
    y_test: &[usize],
    model_kind: ModelKind,
    label_names: &[String],
) -> Result<Metrics> {
    let n_classes = label_names.len();
    let mut model = build_classifier(model_kind);
    model.fit(x_train, y_train, n_classes)?;
    let predictions = model.predict(x_test)?;

    let metrics = ClassificationCalculator::new(n_classes)
        .calculate(LabelInput::new(predictions, y_test.to_vec()))?;

    tracing::debug!(
        model = model_kind.id(),
        train = y_train.len(),
        test = y_test.len(),
        accuracy = metrics.accuracy,
        "Evaluated classifier"
    );

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_sized_by_label_names() {
        let x = SparseMatrix {
            rows: vec![vec![(0, 1.0)], vec![(1, 1.0)]],
            n_features: 2,
        };
        let labels: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let metrics = train_and_evaluate(&x, &x, &[0, 1], &[0, 1], ModelKind::NaiveBayes, &labels).unwrap();

        assert_eq!(metrics.confusion_matrix.len(), 3);
        assert_eq!(metrics.total(), 2);
        assert_eq!(metrics.accuracy, 1.0);
    }
}
