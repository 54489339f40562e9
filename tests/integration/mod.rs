//! Integration tests for toolgate-rs
//!
//! These tests verify the interaction between components over real HTTP,
//! using wiremock servers in place of MCP tool servers.

pub mod config_tests;
pub mod monitor_tests;
pub mod probe_tests;
