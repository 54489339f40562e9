//! Health checking core
//!
//! `mcp` holds the wire types, `client` the retrying and circuit-breaking
//! call path, and `health` the probes and their scoring.

pub mod client;
pub mod health;
pub mod mcp;
