//! Error Handling utilities
//!
//! This module provides the crate error type and the resilience primitives
//! (circuit breaker, retry backoff) used on every check path.

pub mod error;
pub mod recovery;

// Re-export commonly used types and functions
pub use error::*;
pub use recovery::*;
