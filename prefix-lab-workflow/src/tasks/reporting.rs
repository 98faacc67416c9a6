use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prefix_lab_core::{ExperimentConfig, ExperimentRecord, ExperimentResult, Metrics, Result};
use std::collections::BTreeMap;

pub const PLOT_COMPARISON: &str = "comparison";
pub const PLOT_CONFUSION_FULL: &str = "confusion_full";
pub const PLOT_CONFUSION_PREFIX: &str = "confusion_prefix";

/// Renders result charts to opaque image bytes.
pub trait PlotRenderer: Send + Sync {
    fn render_comparison(&self, result: &ExperimentResult) -> Result<Vec<u8>>;

    fn render_confusion(&self, metrics: &Metrics, label_names: &[String], title: &str) -> Result<Vec<u8>>;
}

/// Destination for finished experiment records.
#[async_trait]
pub trait ExperimentSink: Send + Sync {
    async fn record(&self, record: &ExperimentRecord) -> Result<()>;

    fn name(&self) -> &str;
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl ExperimentSink for NoopSink {
    async fn record(&self, _record: &ExperimentRecord) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Hand `record` to `sink`, logging instead of returning any failure.
///
/// Returns whether the sink accepted the record.
pub async fn publish_best_effort(sink: &dyn ExperimentSink, record: &ExperimentRecord) -> bool {
    match sink.record(record).await {
        Ok(()) => {
            tracing::debug!(sink = sink.name(), record_id = %record.id, "Recorded experiment");
            true
        }
        Err(e) => {
            tracing::warn!(
                sink = sink.name(),
                record_id = %record.id,
                error = %e,
                "Failed to record experiment"
            );
            false
        }
    }
}

/// Build the flat record for `result`, attaching base64-encoded plots.
///
/// A plot that fails to render is logged and left out.
pub fn build_record(
    config: &ExperimentConfig,
    result: &ExperimentResult,
    renderer: Option<&dyn PlotRenderer>,
) -> ExperimentRecord {
    let mut plot_blobs = BTreeMap::new();

    if let Some(renderer) = renderer {
        let plots = [
            (PLOT_COMPARISON, renderer.render_comparison(result)),
            (
                PLOT_CONFUSION_FULL,
                renderer.render_confusion(&result.full_text, &result.label_names, "Full Text"),
            ),
            (
                PLOT_CONFUSION_PREFIX,
                renderer.render_confusion(&result.prefix, &result.label_names, "Prefix"),
            ),
        ];

        for (name, rendered) in plots {
            match rendered {
                Ok(bytes) => {
                    plot_blobs.insert(name.to_string(), STANDARD.encode(bytes));
                }
                Err(e) => tracing::warn!(plot = name, error = %e, "Skipping plot"),
            }
        }
    }

    ExperimentRecord::new(config, result, plot_blobs)
}
