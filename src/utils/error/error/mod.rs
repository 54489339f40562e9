//! Error handling for the monitor
//!
//! This module defines the crate-level error type. Errors raised on the
//! check path itself live in `core::client::classifier` and never cross a
//! check-cycle boundary as `MonitorError`.

mod helpers;
mod types;

pub use types::{MonitorError, Result};
