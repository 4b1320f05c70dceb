//! Transport layer for the MCP server.
//!
//! Only the STDIO transport is provided (feature: `stdio`, enabled by
//! default). The transport owns the connection lifecycle and delegates
//! message processing to the MCP server handler. A shutdown future, usually
//! [`shutdown_signal`], cancels the running service.

mod config;
mod error;
mod service;
mod shutdown;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;
pub use shutdown::shutdown_signal;
