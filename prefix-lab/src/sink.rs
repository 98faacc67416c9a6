use async_trait::async_trait;
use prefix_lab_core::{CoreError, ExperimentRecord, Result};
use prefix_lab_workflow::ExperimentSink;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends each record as one JSON line.
pub struct JsonlFileSink {
    path: PathBuf,
    // Serialises appends from concurrent publishers.
    lock: Mutex<()>,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ExperimentSink for JsonlFileSink {
    async fn record(&self, record: &ExperimentRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| CoreError::Sink(format!("{}: {}", self.path.display(), e)))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefix_lab_core::{ExperimentConfig, ExperimentResult, Metrics};
    use prefix_lab_workflow::{build_record, publish_best_effort};

    fn record() -> ExperimentRecord {
        let metrics = Metrics {
            accuracy: 0.8,
            precision: 0.8,
            recall: 0.8,
            f1_score: 0.8,
            confusion_matrix: vec![vec![4, 1], vec![1, 4]],
            predictions: vec![],
            true_labels: vec![],
        };
        let result = ExperimentResult {
            full_text: metrics.clone(),
            prefix: metrics,
            performance_retention: Some(100.0),
            prefix_length: 5,
            dataset_size: 50,
            train_size: 40,
            test_size: 10,
            label_names: vec!["Negative".to_string(), "Positive".to_string()],
        };
        build_record(&ExperimentConfig::new("imdb", "svm", 5), &result, None)
    }

    #[tokio::test]
    async fn test_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("records.jsonl");
        let sink = JsonlFileSink::new(&path);

        sink.record(&record()).await.unwrap();
        sink.record(&record()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: ExperimentRecord = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.model_id, "svm");
        }
    }

    #[tokio::test]
    async fn test_unwritable_path_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for append.
        let sink = JsonlFileSink::new(dir.path());
        assert!(!publish_best_effort(&sink, &record()).await);
    }
}
