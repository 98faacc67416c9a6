use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use prefix_lab_core::{
    DatasetKind, ExperimentConfig, ModelKind, DEFAULT_DATASET_ID, DEFAULT_MODEL_ID,
    DEFAULT_PREFIX_LENGTH,
};
use prefix_lab_workflow::{build_record, publish_best_effort, ExperimentRunner, ExperimentSink, NoopSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod output;
mod sink;

use config::AppConfig;
use output::{OutputFormat, OutputWriter};
use sink::JsonlFileSink;

/// Measure how much classifier accuracy survives truncating documents to a prefix.
#[derive(Debug, Parser)]
#[command(name = "prefix-lab", version, about)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Fixed corpus seed; overrides configuration
    #[arg(long, global = true, env = "PREFIX_LAB_SEED")]
    seed: Option<u64>,

    /// Append experiment records to this JSONL file
    #[arg(long, global = true)]
    sink: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare full-text and prefix classifiers
    Experiment {
        #[arg(short, long, default_value = DEFAULT_DATASET_ID)]
        dataset: String,

        #[arg(short, long, default_value = DEFAULT_MODEL_ID)]
        model: String,

        /// Tokens kept from each document
        #[arg(short, long, default_value_t = DEFAULT_PREFIX_LENGTH, allow_negative_numbers = true)]
        prefix_length: i64,
    },

    /// Sweep accuracy across the token-count ladder
    Sweep {
        #[arg(short, long, default_value = DEFAULT_DATASET_ID)]
        dataset: String,

        #[arg(short, long, default_value = DEFAULT_MODEL_ID)]
        model: String,
    },

    /// Repeat an experiment and summarise the spread of results
    Stability {
        #[arg(short, long, default_value = DEFAULT_DATASET_ID)]
        dataset: String,

        #[arg(short, long, default_value = DEFAULT_MODEL_ID)]
        model: String,

        #[arg(short, long, default_value_t = DEFAULT_PREFIX_LENGTH, allow_negative_numbers = true)]
        prefix_length: i64,

        /// Number of repetitions
        #[arg(short, long, default_value_t = 5)]
        runs: usize,
    },

    /// List available datasets
    Datasets,

    /// List available models
    Models,
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_sink(path: Option<PathBuf>) -> Box<dyn ExperimentSink> {
    match path {
        Some(path) => Box::new(JsonlFileSink::new(path)),
        None => Box::new(NoopSink),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load().context("failed to load configuration")?;
    if cli.seed.is_some() {
        app_config.corpus_seed = cli.seed;
    }
    if cli.sink.is_some() {
        app_config.sink_path = cli.sink.clone();
    }

    init_tracing(&app_config);
    tracing::debug!(?app_config, "Configuration loaded");

    let writer = OutputWriter::new(cli.format, cli.no_color);
    let runner = Arc::new(ExperimentRunner::new(app_config.runner_settings()));
    let sink = build_sink(app_config.sink_path.clone());

    match cli.command {
        Command::Experiment {
            dataset,
            model,
            prefix_length,
        } => {
            let config = ExperimentConfig::new(dataset, model, prefix_length);
            let result = {
                let runner = runner.clone();
                let config = config.clone();
                tokio::task::spawn_blocking(move || runner.run(&config)).await??
            };

            let record = build_record(&config, &result, None);
            publish_best_effort(sink.as_ref(), &record).await;
            writer.write(&result)?;
        }
        Command::Sweep { dataset, model } => {
            let sweep = {
                let runner = runner.clone();
                tokio::task::spawn_blocking(move || runner.compare_token_counts(&dataset, &model))
                    .await??
            };
            writer.write(&sweep)?;
        }
        Command::Stability {
            dataset,
            model,
            prefix_length,
            runs,
        } => {
            let config = ExperimentConfig::new(dataset, model, prefix_length);
            let report = {
                let runner = runner.clone();
                tokio::task::spawn_blocking(move || runner.run_stability_study(&config, runs))
                    .await??
            };
            writer.write(&report)?;
        }
        Command::Datasets => {
            writer.write_list(&DatasetKind::catalog(), &["ID", "Name", "Description", "Samples"])?;
        }
        Command::Models => {
            writer.write_list(&ModelKind::catalog(), &["ID", "Name", "Description"])?;
        }
    }

    Ok(())
}
