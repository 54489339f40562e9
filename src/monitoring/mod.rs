//! Fleet monitoring: scheduled checks, metrics and alerts
//!
//! [`HealthMonitor`] owns the per-server loops and state; `metrics` keeps
//! the time-windowed history and `alerts` delivers status and breaker
//! events.

pub mod alerts;
pub mod metrics;

mod background;
mod system;

pub use alerts::{AlertDispatcher, AlertEvent, AlertKind, AlertSink, ChannelSink};
pub use metrics::{AggregationReport, MetricsCollector, MetricsSummary, TimeWindow};
pub use system::{HealthMonitor, ProfileSet};
