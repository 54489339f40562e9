//! Utility modules for the monitor
//!
//! - **error**: Error types, circuit breaking and retry policies
//! - **net**: Shared HTTP clients

pub mod error;
pub mod net;

use uuid::Uuid;

/// Generate a unique correlation id for a probe request
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
