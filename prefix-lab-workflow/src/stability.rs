use prefix_lab_core::{CoreError, ExperimentConfig, Result};
use prefix_lab_metrics::{AggregatedMetrics, MetricAggregator, StatisticalAnalyzer, StatisticalResult};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::pipeline::ExperimentRunner;

pub const STABILITY_CONFIDENCE: f64 = 0.95;

/// Accuracies from one repetition of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StabilityRun {
    pub full_accuracy: f64,
    pub prefix_accuracy: f64,
    pub performance_retention: Option<f64>,
}

/// How much an experiment's outcome moves between repetitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StabilityReport {
    pub config: ExperimentConfig,
    pub runs: Vec<StabilityRun>,
    pub full_accuracy: AggregatedMetrics,
    pub prefix_accuracy: AggregatedMetrics,
    pub retention: AggregatedMetrics,
    /// 95% interval for mean retention; absent with fewer than two runs.
    pub retention_interval: Option<(f64, f64)>,
    /// Full versus prefix accuracy across runs.
    pub accuracy_gap: StatisticalResult,
}

impl StabilityReport {
    pub fn mean_retention(&self) -> Option<f64> {
        if self.retention.count == 0 {
            None
        } else {
            self.retention.mean.to_f64()
        }
    }

    /// Whether the accuracy gap is significant at `alpha`.
    pub fn gap_is_significant(&self, alpha: f64) -> bool {
        self.accuracy_gap.p_value.is_some_and(|p| p < alpha)
    }
}

impl ExperimentRunner {
    /// Repeat `config` `runs` times and summarise the spread of the results.
    ///
    /// With an entropy corpus seed every run sees a fresh corpus; with a fixed
    /// seed every run is identical and the spread is zero.
    pub fn run_stability_study(&self, config: &ExperimentConfig, runs: usize) -> Result<StabilityReport> {
        if runs == 0 {
            return Err(CoreError::Validation(
                "stability study needs at least one run".to_string(),
            ));
        }
        config.token_budget()?;

        tracing::info!(
            dataset = %config.dataset_id,
            model = %config.model_id,
            runs,
            "Starting stability study"
        );

        let mut results = Vec::with_capacity(runs);
        for run in 0..runs {
            let result = self.run(config)?;
            tracing::debug!(run, retention = ?result.performance_retention, "Stability run finished");
            results.push(StabilityRun {
                full_accuracy: result.full_text.accuracy,
                prefix_accuracy: result.prefix.accuracy,
                performance_retention: result.performance_retention,
            });
        }

        let full: Vec<f64> = results.iter().map(|r| r.full_accuracy).collect();
        let prefix: Vec<f64> = results.iter().map(|r| r.prefix_accuracy).collect();
        let retention: Vec<f64> = results.iter().filter_map(|r| r.performance_retention).collect();

        let report = StabilityReport {
            config: config.clone(),
            full_accuracy: MetricAggregator::aggregate(&full),
            prefix_accuracy: MetricAggregator::aggregate(&prefix),
            retention: MetricAggregator::aggregate(&retention),
            retention_interval: StatisticalAnalyzer::confidence_interval(&retention, STABILITY_CONFIDENCE),
            accuracy_gap: StatisticalAnalyzer::t_test(&full, &prefix),
            runs: results,
        };

        tracing::info!(
            mean_retention = ?report.mean_retention(),
            p_value = ?report.accuracy_gap.p_value,
            "Stability study complete"
        );

        Ok(report)
    }
}
