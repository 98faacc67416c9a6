//! Output formatting for the CLI

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use prefix_lab_core::{DatasetInfo, ExperimentResult, Metrics, ModelInfo, SweepResult};
use prefix_lab_metrics::AggregatedMetrics;
use prefix_lab_workflow::StabilityReport;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tables (default)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format }
    }

    pub fn write<T: Serialize + TableDisplay>(&self, item: &T) -> Result<()> {
        match self.format {
            OutputFormat::Table => item.display_single(),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
        }
        Ok(())
    }

    pub fn write_list<T: Serialize + TableDisplay>(&self, items: &[T], headers: &[&str]) -> Result<()> {
        match self.format {
            OutputFormat::Table => {
                if items.is_empty() {
                    println!("{}", "No items found.".dimmed());
                    return Ok(());
                }
                let mut table = styled_table(headers);
                for item in items {
                    table.add_row(item.to_row());
                }
                println!("{table}");
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        }
        Ok(())
    }
}

/// Trait for displaying items in a table
pub trait TableDisplay {
    fn to_row(&self) -> Vec<Cell>;

    fn display_single(&self);
}

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect::<Vec<_>>());
    table
}

pub fn print_section(title: &str) {
    println!("\n{}", title.bold().underline());
}

pub fn print_field(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn format_retention(retention: Option<f64>) -> String {
    match retention {
        Some(r) => format!("{:.1}%", r),
        None => "n/a".to_string(),
    }
}

fn metric_cells(arm: &str, m: &Metrics) -> Vec<Cell> {
    vec![
        Cell::new(arm),
        Cell::new(format_percent(m.accuracy)),
        Cell::new(format_percent(m.precision)),
        Cell::new(format_percent(m.recall)),
        Cell::new(format_percent(m.f1_score)),
    ]
}

fn confusion_table(metrics: &Metrics, label_names: &[String]) -> Table {
    let mut headers = vec!["true \\ predicted"];
    headers.extend(label_names.iter().map(String::as_str));
    let mut table = styled_table(&headers);
    for (name, row) in label_names.iter().zip(&metrics.confusion_matrix) {
        let mut cells = vec![Cell::new(name).fg(Color::Cyan)];
        cells.extend(row.iter().map(Cell::new));
        table.add_row(cells);
    }
    table
}

impl TableDisplay for ExperimentResult {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.prefix_length),
            Cell::new(format_percent(self.full_text.accuracy)),
            Cell::new(format_percent(self.prefix.accuracy)),
            Cell::new(format_retention(self.performance_retention)),
        ]
    }

    fn display_single(&self) {
        print_section("Experiment");
        print_field("Prefix length", &self.prefix_length.to_string());
        print_field(
            "Samples",
            &format!("{} ({} train / {} test)", self.dataset_size, self.train_size, self.test_size),
        );
        print_field("Labels", &self.label_names.join(", "));

        print_section("Scores");
        let mut table = styled_table(&["Arm", "Accuracy", "Precision", "Recall", "F1"]);
        table.add_row(metric_cells("Full text", &self.full_text));
        table.add_row(metric_cells("Prefix", &self.prefix));
        println!("{table}");

        let retention = format_retention(self.performance_retention);
        let retention = match self.performance_retention {
            Some(r) if r >= 90.0 => retention.as_str().green(),
            Some(_) => retention.as_str().yellow(),
            None => retention.as_str().dimmed(),
        };
        println!("\n{} {}", "Retention:".bold(), retention);

        print_section("Confusion (full text)");
        println!("{}", confusion_table(&self.full_text, &self.label_names));
        print_section("Confusion (prefix)");
        println!("{}", confusion_table(&self.prefix, &self.label_names));
    }
}

impl TableDisplay for SweepResult {
    fn to_row(&self) -> Vec<Cell> {
        vec![Cell::new(self.token_counts.len())]
    }

    fn display_single(&self) {
        print_section("Token sweep");
        let mut table = styled_table(&["Tokens", "Accuracy"]);
        for (budget, accuracy) in self.points() {
            table.add_row(vec![Cell::new(budget), Cell::new(format_percent(accuracy))]);
        }
        println!("{table}");
    }
}

fn aggregate_cells(name: &str, agg: &AggregatedMetrics) -> Vec<Cell> {
    vec![
        Cell::new(name),
        Cell::new(agg.mean),
        Cell::new(agg.std_dev),
        Cell::new(agg.min),
        Cell::new(agg.max),
        Cell::new(agg.count),
    ]
}

impl TableDisplay for StabilityReport {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.config.dataset_id),
            Cell::new(&self.config.model_id),
            Cell::new(self.runs.len()),
            Cell::new(format_retention(self.mean_retention())),
        ]
    }

    fn display_single(&self) {
        print_section("Stability study");
        print_field("Dataset", &self.config.dataset_id);
        print_field("Model", &self.config.model_id);
        print_field("Prefix length", &self.config.prefix_length.to_string());
        print_field("Runs", &self.runs.len().to_string());

        let mut table = styled_table(&["Quantity", "Mean", "Std dev", "Min", "Max", "N"]);
        table.add_row(aggregate_cells("Full accuracy", &self.full_accuracy));
        table.add_row(aggregate_cells("Prefix accuracy", &self.prefix_accuracy));
        table.add_row(aggregate_cells("Retention %", &self.retention));
        println!("{table}");

        if let Some((low, high)) = self.retention_interval {
            print_field("Retention 95% CI", &format!("[{:.2}, {:.2}]", low, high));
        }
        let p_value = self
            .accuracy_gap
            .p_value
            .map_or_else(|| "n/a".to_string(), |p| format!("{:.4}", p));
        print_field("Full vs prefix t", &format!("{:.3} (p = {})", self.accuracy_gap.statistic, p_value));
    }
}

impl TableDisplay for DatasetInfo {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.id).fg(Color::Green),
            Cell::new(&self.name),
            Cell::new(&self.description),
            Cell::new(self.samples),
        ]
    }

    fn display_single(&self) {
        print_section(&self.name);
        print_field("ID", &self.id);
        print_field("Description", &self.description);
        print_field("Samples", &self.samples.to_string());
    }
}

impl TableDisplay for ModelInfo {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.id).fg(Color::Green),
            Cell::new(&self.name),
            Cell::new(&self.description),
        ]
    }

    fn display_single(&self) {
        print_section(&self.name);
        print_field("ID", &self.id);
        print_field("Description", &self.description);
    }
}
