//! Configuration validation
//!
//! The validation is organized into several submodules:
//! - `trait_def`: Core Validate trait definition
//! - `probe_url`: URL shape checks for probe endpoints
//! - `server_validators`: Server profile and auth validators
//! - `monitoring_validators`: Monitor-wide validators (defaults, scoring, metrics, alerts)
//! - `tests`: Test suite for all validators

mod monitoring_validators;
mod probe_url;
mod server_validators;
mod trait_def;

pub use probe_url::validate_probe_url;
pub use trait_def::Validate;
