//! Resilient probe client
//!
//! Error classification, per-server call statistics and the retrying,
//! breaker-gated executor every probe goes through.

pub mod classifier;
pub mod resilient;
pub mod stats;


pub use classifier::{CheckError, ErrorType, FailureSignal, classify};
pub use resilient::{BreakerEvent, ResilientClient, ServerConnection};
pub use stats::ConnectionStats;
