use prefix_lab_core::domain::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;

fn metrics(accuracy: f64) -> Metrics {
    Metrics {
        accuracy,
        precision: accuracy,
        recall: accuracy,
        f1_score: accuracy,
        confusion_matrix: vec![vec![1, 0], vec![0, 1]],
        predictions: vec![0, 1],
        true_labels: vec![0, 1],
    }
}

fn result(full: f64, prefix: f64) -> ExperimentResult {
    ExperimentResult {
        full_text: metrics(full),
        prefix: metrics(prefix),
        performance_retention: performance_retention(full, prefix),
        prefix_length: 50,
        dataset_size: 2000,
        train_size: 1600,
        test_size: 400,
        label_names: vec!["Negative".to_string(), "Positive".to_string()],
    }
}

#[test]
fn test_experiment_result_json_shape() {
    let value = serde_json::to_value(result(0.8, 0.6)).unwrap();

    assert_eq!(value["dataset_size"], json!(2000));
    assert_eq!(value["label_names"], json!(["Negative", "Positive"]));
    assert_eq!(value["full_text"]["confusion_matrix"], json!([[1, 0], [0, 1]]));
    let retention = value["performance_retention"].as_f64().unwrap();
    assert!((retention - 75.0).abs() < 1e-9);
}

#[test]
fn test_undefined_retention_serializes_as_null() {
    let value = serde_json::to_value(result(0.0, 0.4)).unwrap();
    assert!(value["performance_retention"].is_null());
}

#[test]
fn test_sweep_result_json_shape() {
    let sweep = SweepResult {
        token_counts: TOKEN_LADDER.to_vec(),
        accuracies: vec![0.5; 10],
    };
    let value = serde_json::to_value(&sweep).unwrap();

    assert_eq!(
        value["token_counts"],
        json!([5, 10, 20, 30, 50, 75, 100, 150, 200, "Full"])
    );

    let parsed: SweepResult = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, sweep);
}

#[test]
fn test_sweep_points_pair_budget_with_accuracy() {
    let sweep = SweepResult {
        token_counts: vec![TokenBudget::Tokens(5), TokenBudget::Full],
        accuracies: vec![0.6, 0.9],
    };
    let points: Vec<_> = sweep.points().collect();
    assert_eq!(points, vec![(TokenBudget::Tokens(5), 0.6), (TokenBudget::Full, 0.9)]);
}

#[test]
fn test_experiment_record_flattens_result() {
    let config = ExperimentConfig::new("imdb", "svm", 50);
    let mut plots = BTreeMap::new();
    plots.insert("comparison".to_string(), "aGVsbG8=".to_string());

    let record = ExperimentRecord::new(&config, &result(0.9, 0.8), plots);
    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["dataset_id"], json!("imdb"));
    assert_eq!(value["model_id"], json!("svm"));
    assert_eq!(value["prefix_length"], json!(50));
    assert_eq!(value["test_size"], json!(400));
    assert_eq!(value["plot_blobs"]["comparison"], json!("aGVsbG8="));
    assert!(value["full_text_metrics"]["accuracy"].is_number());
    assert!(value["recorded_at"].is_string());
}

#[test]
fn test_corpus_seed_serialization() {
    assert_eq!(serde_json::to_value(CorpusSeed::Entropy).unwrap(), json!("entropy"));
    assert_eq!(serde_json::to_value(CorpusSeed::Fixed(9)).unwrap(), json!({"fixed": 9}));
}
