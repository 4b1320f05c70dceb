//! Error types and handling for the MCP server.
//!
//! This module defines a unified error type for failures that stop the
//! server while it is being built. Transport failures are reported as
//! [`TransportError`](super::transport::TransportError). Errors of
//! individual tool calls never reach this level; they are reported to the
//! client inside the tool result.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// A tool could not be registered at startup.
    #[error("Tool registration failed: {0}")]
    Registry(#[from] crate::domains::tools::RegistryError),
}
