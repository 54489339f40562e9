//! Network utilities

pub mod http;

pub use http::get_client_with_timeout;
