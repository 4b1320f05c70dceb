//! Envio MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing a calculator, text
//! statistics and a scaffolding tool that initializes Envio indexer projects.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the server handler and the
//!   transport layer
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: parameter schemas, the tool registry and the tools
//!
//! # Example
//!
//! ```rust,no_run
//! use envio_mcp_server::{Config, McpServer};
//! use envio_mcp_server::core::{TransportService, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let transport = TransportService::new(config.transport.clone());
//!     let server = McpServer::new(config)?;
//!     transport.run(server, shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
