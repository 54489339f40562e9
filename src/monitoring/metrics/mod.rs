//! Time-windowed metrics for check results
//!
//! `collector` stores per-server histories, `report` aggregates a window of
//! them and `types` holds the records and report value objects.

mod bounded;
pub mod collector;
pub mod helpers;
mod report;
#[cfg(test)]
mod tests;
pub mod types;

pub use collector::MetricsCollector;
pub use helpers::{calculate_average, nearest_rank_percentile};
pub use types::{
    AggregationReport, HistogramEntry, MetricsRecord, MetricsSnapshot, MetricsSummary,
    PathReport, RecordedResult, ServerSummary, TimeWindow,
};
