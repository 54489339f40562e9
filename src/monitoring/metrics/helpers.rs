//! Helper functions for metrics calculations

use super::types::HistogramEntry;
use std::collections::HashMap;

/// Nearest-rank percentile: the value at rank `ceil(p * n)` of the sorted samples
pub fn nearest_rank_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let n = sorted_values.len();
    // Guard against 0.95 * 20 landing a hair above 19.
    let rank = ((percentile.clamp(0.0, 1.0) * n as f64) - 1e-9).ceil() as usize;
    let index = rank.clamp(1, n) - 1;
    sorted_values[index]
}

/// Arithmetic mean, 0.0 for no samples
pub fn calculate_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub(super) fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// The `n` most frequent values, ties broken by value
pub(super) fn top_n(counts: HashMap<String, u64>, n: usize) -> Vec<HistogramEntry> {
    let mut entries: Vec<HistogramEntry> = counts
        .into_iter()
        .map(|(value, count)| HistogramEntry { value, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    entries.truncate(n);
    entries
}
