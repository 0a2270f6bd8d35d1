//! Statistics Calculator Module
//! Descriptive statistics over per-state breach counts.

use crate::data::BreachTally;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Median, Min};

/// Summary of the per-state counts of one map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountSummary {
    /// States with at least one breach.
    pub states_reporting: usize,
    pub total: u64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for CountSummary {
    fn default() -> Self {
        Self {
            states_reporting: 0,
            total: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

impl CountSummary {
    /// Statistics over the states that reported at least one breach.
    pub fn from_tally(tally: &BreachTally) -> Self {
        let values: Vec<f64> = tally.counts.values().map(|&c| c as f64).collect();
        let mut summary = StatsCalculator::compute_descriptive_stats(&values);
        summary.total = tally.total_mapped();
        summary
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> CountSummary {
        let n = values.len();
        if n == 0 {
            return CountSummary::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let data = Data::new(sorted.clone());
        let mean = data.mean().unwrap_or(f64::NAN);
        let std = if n > 1 {
            data.std_dev().unwrap_or(0.0)
        } else {
            0.0
        };

        CountSummary {
            states_reporting: n,
            total: values.iter().sum::<f64>() as u64,
            mean,
            median: data.median(),
            std,
            min: data.min(),
            max: data.max(),
            p95: Self::percentile(&sorted, 95.0),
            p05: Self::percentile(&sorted, 5.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// `bins + 1` quantile edges from min to max, used as legend ticks.
    pub fn quantile_breaks(values: &[f64], bins: usize) -> Vec<f64> {
        if values.is_empty() || bins == 0 {
            return Vec::new();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut breaks: Vec<f64> = (0..=bins)
            .map(|i| Self::percentile(&sorted, 100.0 * i as f64 / bins as f64))
            .collect();
        breaks.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);
        breaks
    }
}
