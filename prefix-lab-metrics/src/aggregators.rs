use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Summary statistics over repeated measurements of one quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedMetrics {
    pub mean: Decimal,
    pub median: Decimal,
    pub std_dev: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub p10: Decimal,
    pub p90: Decimal,
    pub count: usize,
}

pub struct MetricAggregator;

impl MetricAggregator {
    pub fn aggregate(values: &[f64]) -> AggregatedMetrics {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self::empty();
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        // Sample standard deviation; a single run has no spread.
        let std_dev = if sorted.len() > 1 {
            (sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        AggregatedMetrics {
            mean: to_decimal(mean),
            median: to_decimal(Self::percentile(&sorted, 50.0)),
            std_dev: to_decimal(std_dev),
            min: to_decimal(sorted[0]),
            max: to_decimal(sorted[sorted.len() - 1]),
            p10: to_decimal(Self::percentile(&sorted, 10.0)),
            p90: to_decimal(Self::percentile(&sorted, 90.0)),
            count: sorted.len(),
        }
    }

    /// Calculate weighted average
    pub fn weighted_average(values: &[f64], weights: &[f64]) -> Option<f64> {
        if values.len() != weights.len() || values.is_empty() {
            return None;
        }

        let weight_sum: f64 = weights.iter().sum();
        if weight_sum == 0.0 {
            return None;
        }

        let weighted_sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
        Some(weighted_sum / weight_sum)
    }

    /// Linear-interpolated percentile over already sorted values.
    pub fn percentile(sorted_values: &[f64], percentile: f64) -> f64 {
        match sorted_values.len() {
            0 => 0.0,
            1 => sorted_values[0],
            len => {
                let rank = (percentile.clamp(0.0, 100.0) / 100.0) * (len - 1) as f64;
                let lower = rank.floor() as usize;
                let upper = rank.ceil() as usize;
                let fraction = rank - lower as f64;
                sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * fraction
            }
        }
    }

    fn empty() -> AggregatedMetrics {
        AggregatedMetrics {
            mean: Decimal::ZERO,
            median: Decimal::ZERO,
            std_dev: Decimal::ZERO,
            min: Decimal::ZERO,
            max: Decimal::ZERO,
            p10: Decimal::ZERO,
            p90: Decimal::ZERO,
            count: 0,
        }
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default().round_dp(6)
}
