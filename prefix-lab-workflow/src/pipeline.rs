use prefix_lab_core::{
    performance_retention, Corpus, CorpusSeed, ExperimentConfig, ExperimentResult,
    Metrics, ModelKind, Result, SweepResult, TokenBudget, TOKEN_LADDER,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::split::{stratified_split, DataSplit, DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION};
use crate::tasks::{extract_all, train_and_evaluate, CorpusGenerator, TfidfVectorizer, DEFAULT_MAX_FEATURES};

/// Knobs shared by every run of an [`ExperimentRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerSettings {
    pub corpus_seed: CorpusSeed,
    pub split_seed: u64,
    pub test_fraction: f64,
    pub max_features: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            corpus_seed: CorpusSeed::Entropy,
            split_seed: DEFAULT_SPLIT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

/// Runs full-text versus prefix experiments.
///
/// Holds only immutable settings; every call builds its own corpus, split,
/// vectorizers and models, so one runner can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct ExperimentRunner {
    settings: RunnerSettings,
}

/// Texts and labels of one split.
struct SplitData {
    train_texts: Vec<String>,
    test_texts: Vec<String>,
    train_labels: Vec<usize>,
    test_labels: Vec<usize>,
}

impl SplitData {
    fn from_corpus(corpus: &Corpus, split: &DataSplit) -> Self {
        let texts = corpus.texts();
        let labels = corpus.labels();
        Self {
            train_texts: DataSplit::select(&split.train, &texts),
            test_texts: DataSplit::select(&split.test, &texts),
            train_labels: DataSplit::select(&split.train, &labels),
            test_labels: DataSplit::select(&split.test, &labels),
        }
    }
}

/// One vectorize, train and evaluate pass over a single text variant.
struct ArmRun<'a> {
    name: &'static str,
    train_texts: &'a [String],
    test_texts: &'a [String],
}

impl ArmRun<'_> {
    fn evaluate(
        &self,
        data: &SplitData,
        model: ModelKind,
        label_names: &[String],
        max_features: usize,
    ) -> Result<Metrics> {
        let vectorizer = TfidfVectorizer::with_max_features(max_features).fit(self.train_texts)?;
        let x_train = vectorizer.transform(self.train_texts);
        let x_test = vectorizer.transform(self.test_texts);

        tracing::debug!(
            arm = self.name,
            features = vectorizer.n_features(),
            "Vectorized arm"
        );

        train_and_evaluate(
            &x_train,
            &x_test,
            &data.train_labels,
            &data.test_labels,
            model,
            label_names,
        )
    }
}

impl ExperimentRunner {
    pub fn new(settings: RunnerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    fn prepare(&self, dataset_id: &str) -> Result<(Corpus, SplitData)> {
        let corpus = CorpusGenerator::new(self.settings.corpus_seed).generate(dataset_id)?;
        let split = stratified_split(
            &corpus.labels(),
            corpus.label_names().len(),
            self.settings.test_fraction,
            self.settings.split_seed,
        )?;
        let data = SplitData::from_corpus(&corpus, &split);
        Ok((corpus, data))
    }

    /// Compare a classifier trained on full documents against one trained on
    /// their first `prefix_length` tokens.
    pub fn run_experiment(
        &self,
        dataset_id: &str,
        model_id: &str,
        prefix_length: i64,
    ) -> Result<ExperimentResult> {
        self.run(&ExperimentConfig::new(dataset_id, model_id, prefix_length))
    }

    pub fn run(&self, config: &ExperimentConfig) -> Result<ExperimentResult> {
        let prefix_length = config.token_budget()?;
        let model = ModelKind::resolve(&config.model_id);
        let started = Instant::now();

        tracing::info!(
            dataset = %config.dataset_id,
            model = model.id(),
            prefix_length,
            "Starting experiment"
        );

        let (corpus, data) = self.prepare(&config.dataset_id)?;
        let label_names = corpus.label_names().to_vec();

        let prefix_train = extract_all(&data.train_texts, prefix_length);
        let prefix_test = extract_all(&data.test_texts, prefix_length);

        let full_arm = ArmRun {
            name: "full_text",
            train_texts: &data.train_texts,
            test_texts: &data.test_texts,
        };
        let prefix_arm = ArmRun {
            name: "prefix",
            train_texts: &prefix_train,
            test_texts: &prefix_test,
        };

        let full_text = full_arm.evaluate(&data, model, &label_names, self.settings.max_features)?;
        let prefix = prefix_arm.evaluate(&data, model, &label_names, self.settings.max_features)?;
        let retention = performance_retention(full_text.accuracy, prefix.accuracy);

        tracing::info!(
            full_accuracy = full_text.accuracy,
            prefix_accuracy = prefix.accuracy,
            retention = ?retention,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Experiment complete"
        );

        Ok(ExperimentResult {
            full_text,
            prefix,
            performance_retention: retention,
            prefix_length,
            dataset_size: corpus.len(),
            train_size: data.train_labels.len(),
            test_size: data.test_labels.len(),
            label_names,
        })
    }

    /// Accuracy of prefix-trained models across [`TOKEN_LADDER`].
    ///
    /// One corpus and split serve every ladder point.
    pub fn compare_token_counts(&self, dataset_id: &str, model_id: &str) -> Result<SweepResult> {
        let model = ModelKind::resolve(model_id);
        tracing::info!(dataset = dataset_id, model = model.id(), "Starting token sweep");

        let (corpus, data) = self.prepare(dataset_id)?;
        let label_names = corpus.label_names();

        let mut token_counts = Vec::with_capacity(TOKEN_LADDER.len());
        let mut accuracies = Vec::with_capacity(TOKEN_LADDER.len());

        for budget in TOKEN_LADDER {
            let (train_texts, test_texts) = match budget {
                TokenBudget::Tokens(n) => (
                    extract_all(&data.train_texts, n),
                    extract_all(&data.test_texts, n),
                ),
                TokenBudget::Full => (data.train_texts.clone(), data.test_texts.clone()),
            };

            let arm = ArmRun {
                name: "sweep",
                train_texts: &train_texts,
                test_texts: &test_texts,
            };
            let metrics = arm.evaluate(&data, model, label_names, self.settings.max_features)?;
            tracing::debug!(budget = %budget, accuracy = metrics.accuracy, "Evaluated ladder point");

            token_counts.push(budget);
            accuracies.push(metrics.accuracy);
        }

        tracing::info!(points = token_counts.len(), "Token sweep complete");
        Ok(SweepResult {
            token_counts,
            accuracies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefix_lab_core::CoreError;

    fn seeded() -> ExperimentRunner {
        ExperimentRunner::new(RunnerSettings {
            corpus_seed: CorpusSeed::Fixed(11),
            ..RunnerSettings::default()
        })
    }

    #[test]
    fn test_negative_prefix_rejected_before_work() {
        let err = seeded().run_experiment("imdb", "logistic", -1).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_runner_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExperimentRunner>();
    }

    #[test]
    fn test_fixed_seed_reproduces_results() {
        let runner = seeded();
        let a = runner.run_experiment("news", "naive_bayes", 10).unwrap();
        let b = runner.run_experiment("news", "naive_bayes", 10).unwrap();
        assert_eq!(a, b);
    }
}
