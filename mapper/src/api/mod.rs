//! HTTP API module.
//!
//! The HTTP server, its request/response types and the log side channel
//! shared with the rest of the crate.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::start_server;
pub use types::*;
