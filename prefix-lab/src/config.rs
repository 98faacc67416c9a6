use anyhow::Result;
use config::{Config as ConfigLoader, Environment, File};
use prefix_lab_core::CorpusSeed;
use prefix_lab_workflow::{RunnerSettings, DEFAULT_MAX_FEATURES, DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "PREFIX_LAB";
pub const DEFAULT_LOG_FILTER: &str = "prefix_lab=info,prefix_lab_workflow=info";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// `tracing` filter directives, used when `RUST_LOG` is unset.
    pub log_level: String,
    pub log_json: bool,
    /// Fixed corpus seed; unset draws a fresh corpus every run.
    pub corpus_seed: Option<u64>,
    pub split_seed: u64,
    pub test_fraction: f64,
    pub max_features: usize,
    /// JSONL file that receives one record per experiment.
    pub sink_path: Option<PathBuf>,
}

impl AppConfig {
    /// Layer `config/default`, `config/local` and `PREFIX_LAB_*` variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config"))
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let config = ConfigLoader::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join("local")).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            corpus_seed: CorpusSeed::from_option(self.corpus_seed),
            split_seed: self.split_seed,
            test_fraction: self.test_fraction,
            max_features: self.max_features,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
            corpus_seed: None,
            split_seed: DEFAULT_SPLIT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            max_features: DEFAULT_MAX_FEATURES,
            sink_path: None,
        }
    }
}
