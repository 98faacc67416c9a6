use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::config::ExperimentConfig;
use super::evaluation::Metrics;
use super::ids::RecordId;

// ===== Token Budgets =====

/// One point on the truncation ladder: a token count or the untruncated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenBudget {
    Tokens(usize),
    Full,
}

/// Budgets swept by a token-count comparison, in order.
pub const TOKEN_LADDER: [TokenBudget; 10] = [
    TokenBudget::Tokens(5),
    TokenBudget::Tokens(10),
    TokenBudget::Tokens(20),
    TokenBudget::Tokens(30),
    TokenBudget::Tokens(50),
    TokenBudget::Tokens(75),
    TokenBudget::Tokens(100),
    TokenBudget::Tokens(150),
    TokenBudget::Tokens(200),
    TokenBudget::Full,
];

const FULL_LITERAL: &str = "Full";

impl fmt::Display for TokenBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenBudget::Tokens(n) => write!(f, "{}", n),
            TokenBudget::Full => f.write_str(FULL_LITERAL),
        }
    }
}

impl Serialize for TokenBudget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TokenBudget::Tokens(n) => serializer.serialize_u64(*n as u64),
            TokenBudget::Full => serializer.serialize_str(FULL_LITERAL),
        }
    }
}

impl<'de> Deserialize<'de> for TokenBudget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BudgetVisitor;

        impl<'de> Visitor<'de> for BudgetVisitor {
            type Value = TokenBudget;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a non-negative token count or \"{}\"", FULL_LITERAL)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TokenBudget, E> {
                Ok(TokenBudget::Tokens(v as usize))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TokenBudget, E> {
                usize::try_from(v)
                    .map(TokenBudget::Tokens)
                    .map_err(|_| E::custom("token count must be non-negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TokenBudget, E> {
                if v == FULL_LITERAL {
                    Ok(TokenBudget::Full)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(BudgetVisitor)
    }
}

// ===== Results =====

/// Prefix accuracy as a percentage of full-text accuracy.
///
/// Returns `None` when the full-text accuracy is zero.
pub fn performance_retention(full_accuracy: f64, prefix_accuracy: f64) -> Option<f64> {
    if full_accuracy > 0.0 {
        Some(100.0 * prefix_accuracy / full_accuracy)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentResult {
    pub full_text: Metrics,
    pub prefix: Metrics,
    pub performance_retention: Option<f64>,
    pub prefix_length: usize,
    pub dataset_size: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub label_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepResult {
    pub token_counts: Vec<TokenBudget>,
    pub accuracies: Vec<f64>,
}

impl SweepResult {
    pub fn points(&self) -> impl Iterator<Item = (TokenBudget, f64)> + '_ {
        self.token_counts
            .iter()
            .copied()
            .zip(self.accuracies.iter().copied())
    }
}

/// Flat record handed to a persistence collaborator after an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRecord {
    pub id: RecordId,
    pub dataset_id: String,
    pub model_id: String,
    pub prefix_length: i64,
    pub full_text_metrics: Metrics,
    pub prefix_metrics: Metrics,
    pub performance_retention: Option<f64>,
    pub dataset_size: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub label_names: Vec<String>,
    /// Plot name to base64-encoded image bytes.
    pub plot_blobs: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
}

impl ExperimentRecord {
    pub fn new(
        config: &ExperimentConfig,
        result: &ExperimentResult,
        plot_blobs: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            dataset_id: config.dataset_id.clone(),
            model_id: config.model_id.clone(),
            prefix_length: config.prefix_length,
            full_text_metrics: result.full_text.clone(),
            prefix_metrics: result.prefix.clone(),
            performance_retention: result.performance_retention,
            dataset_size: result.dataset_size,
            train_size: result.train_size,
            test_size: result.test_size,
            label_names: result.label_names.clone(),
            plot_blobs,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_guards_zero() {
        assert_eq!(performance_retention(0.0, 0.5), None);
        assert_eq!(performance_retention(0.5, 0.25), Some(50.0));
    }

    #[test]
    fn test_ladder_ends_with_full() {
        assert_eq!(TOKEN_LADDER.len(), 10);
        assert_eq!(TOKEN_LADDER[9], TokenBudget::Full);
    }

    #[test]
    fn test_budget_serialization() {
        let json = serde_json::to_string(&vec![TokenBudget::Tokens(5), TokenBudget::Full]).unwrap();
        assert_eq!(json, r#"[5,"Full"]"#);

        let parsed: Vec<TokenBudget> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![TokenBudget::Tokens(5), TokenBudget::Full]);
    }

    #[test]
    fn test_budget_rejects_other_strings() {
        assert!(serde_json::from_str::<TokenBudget>(r#""All""#).is_err());
        assert!(serde_json::from_str::<TokenBudget>("-3").is_err());
    }
}
