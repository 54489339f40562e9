//! Alert events and their delivery
//!
//! The monitor raises an [`AlertEvent`] when a server's overall status
//! changes or its circuit breaker opens or closes again.

mod channels;
mod manager;
mod types;

pub use channels::{AlertSink, ChannelSink, LoggingSink};
pub use manager::AlertDispatcher;
pub use types::{AlertEvent, AlertKind, AlertSeverity, AlertStats};
