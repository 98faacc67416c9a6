use approx::assert_relative_eq;
use prefix_lab_core::{CorpusSeed, TokenBudget};
use prefix_lab_workflow::*;
use pretty_assertions::assert_eq;

fn assert_matrix_consistent(metrics: &prefix_lab_core::Metrics, test_size: usize) {
    assert_eq!(metrics.total() as usize, test_size);
    assert_eq!(metrics.true_labels.len(), test_size);
    assert_eq!(metrics.predictions.len(), test_size);

    let n = metrics.confusion_matrix.len();
    let mut truth = vec![0u64; n];
    let mut predicted = vec![0u64; n];
    for (&t, &p) in metrics.true_labels.iter().zip(&metrics.predictions) {
        truth[t] += 1;
        predicted[p] += 1;
    }
    assert_eq!(metrics.row_sums(), truth);
    assert_eq!(metrics.column_sums(), predicted);
}

#[test]
fn test_imdb_logistic_experiment_shape() {
    let runner = ExperimentRunner::default();
    let result = runner.run_experiment("imdb", "logistic", 50).unwrap();

    assert_eq!(result.label_names, vec!["Negative", "Positive"]);
    assert_eq!(result.dataset_size, 2000);
    assert_eq!(result.train_size, 1600);
    assert_eq!(result.test_size, 400);
    assert_eq!(result.prefix_length, 50);

    let retention = result.performance_retention.unwrap();
    assert!(retention >= 0.0);
    assert_relative_eq!(
        retention,
        100.0 * result.prefix.accuracy / result.full_text.accuracy,
        epsilon = 1e-9
    );

    assert_matrix_consistent(&result.full_text, result.test_size);
    assert_matrix_consistent(&result.prefix, result.test_size);
}

#[test]
fn test_split_is_stratified() {
    let runner = ExperimentRunner::new(RunnerSettings {
        corpus_seed: CorpusSeed::Fixed(17),
        ..RunnerSettings::default()
    });
    let result = runner.run_experiment("news", "naive_bayes", 20).unwrap();

    let corpus = CorpusGenerator::new(CorpusSeed::Fixed(17)).generate("news").unwrap();
    let test_counts = result.full_text.row_sums();
    for (class, &count) in corpus.label_counts().iter().enumerate() {
        let expected = count as f64 * 0.2;
        assert!((test_counts[class] as f64 - expected).abs() <= 1.0);
    }
}

#[test]
fn test_news_svm_sweep() {
    let runner = ExperimentRunner::new(RunnerSettings {
        corpus_seed: CorpusSeed::Fixed(4),
        ..RunnerSettings::default()
    });
    let sweep = runner.compare_token_counts("news", "svm").unwrap();

    assert_eq!(sweep.token_counts.len(), 10);
    assert_eq!(sweep.accuracies.len(), 10);
    assert_eq!(sweep.token_counts[9], TokenBudget::Full);
    assert!(sweep.accuracies.iter().all(|a| (0.0..=1.0).contains(a)));

    let json = serde_json::to_value(&sweep).unwrap();
    assert_eq!(json["token_counts"][9], "Full");
    assert_eq!(json["token_counts"][0], 5);
}

#[test]
fn test_unknown_ids_default_silently() {
    let runner = ExperimentRunner::new(RunnerSettings {
        corpus_seed: CorpusSeed::Fixed(2),
        ..RunnerSettings::default()
    });
    let fallback = runner.run_experiment("reviews", "gpt", 10).unwrap();
    let explicit = runner.run_experiment("imdb", "logistic", 10).unwrap();
    assert_eq!(fallback, explicit);
}

#[test]
fn test_zero_prefix_uses_whole_documents() {
    let runner = ExperimentRunner::new(RunnerSettings {
        corpus_seed: CorpusSeed::Fixed(6),
        ..RunnerSettings::default()
    });
    let result = runner.run_experiment("imdb", "naive_bayes", 0).unwrap();
    assert_eq!(result.full_text, result.prefix);
    assert_relative_eq!(result.performance_retention.unwrap(), 100.0, epsilon = 1e-9);
}

#[test]
fn test_concurrent_runs_share_one_runner() {
    let runner = std::sync::Arc::new(ExperimentRunner::new(RunnerSettings {
        corpus_seed: CorpusSeed::Fixed(30),
        ..RunnerSettings::default()
    }));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let runner = runner.clone();
            std::thread::spawn(move || runner.run_experiment("imdb", "naive_bayes", 10))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(results[0], results[1]);
}
