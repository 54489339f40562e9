//! Common test utilities for toolgate-rs
//!
//! # Usage
//!
//! ```rust
//! use crate::common::{McpServer, ProfileFactory};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let server = McpServer::start().await;
//!     server.with_tools(&["search"]).await;
//!     let profile = ProfileFactory::dual("search", &server);
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mcp_server;

// Re-export commonly used items
pub use assertions::DualResultAssertions;
pub use fixtures::{ProfileFactory, monitor_config};
pub use mcp_server::McpServer;

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a result is Err
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
