use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;

// ===== Corpus Seeding =====

/// How the corpus generator seeds its random source.
///
/// `Entropy` reseeds from the operating system on every generation call, so
/// two experiments with identical configuration see different corpora.
/// `Fixed` makes corpora reproducible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorpusSeed {
    #[default]
    Entropy,
    Fixed(u64),
}

impl CorpusSeed {
    pub fn from_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => CorpusSeed::Fixed(seed),
            None => CorpusSeed::Entropy,
        }
    }

    pub fn is_reproducible(&self) -> bool {
        matches!(self, CorpusSeed::Fixed(_))
    }
}

// ===== Experiment Configuration =====

pub const DEFAULT_DATASET_ID: &str = "imdb";
pub const DEFAULT_MODEL_ID: &str = "logistic";
pub const DEFAULT_PREFIX_LENGTH: i64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ExperimentConfig {
    pub dataset_id: String,
    pub model_id: String,
    #[validate(range(min = 0))]
    pub prefix_length: i64,
}

impl ExperimentConfig {
    pub fn new(dataset_id: impl Into<String>, model_id: impl Into<String>, prefix_length: i64) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            model_id: model_id.into(),
            prefix_length,
        }
    }

    /// Validate and return the prefix length as a token count.
    pub fn token_budget(&self) -> Result<usize> {
        self.validate()?;
        Ok(self.prefix_length as usize)
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATASET_ID, DEFAULT_MODEL_ID, DEFAULT_PREFIX_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_seed_default_is_entropy() {
        assert_eq!(CorpusSeed::default(), CorpusSeed::Entropy);
        assert!(!CorpusSeed::default().is_reproducible());
    }

    #[test]
    fn test_corpus_seed_from_option() {
        assert_eq!(CorpusSeed::from_option(Some(7)), CorpusSeed::Fixed(7));
        assert_eq!(CorpusSeed::from_option(None), CorpusSeed::Entropy);
    }

    #[test]
    fn test_token_budget_rejects_negative() {
        let config = ExperimentConfig::new("imdb", "svm", -1);
        assert!(config.token_budget().is_err());
    }

    #[test]
    fn test_token_budget_accepts_zero() {
        let config = ExperimentConfig::new("imdb", "svm", 0);
        assert_eq!(config.token_budget().unwrap(), 0);
    }
}
