//! Transport service - starts the MCP server on the configured transport.

use std::future::Future;

use tracing::info;

use super::{TransportConfig, TransportResult};
use crate::core::McpServer;

#[cfg(feature = "stdio")]
use super::stdio::StdioTransport;

/// Transport service - manages the transport layer for the MCP server.
pub struct TransportService {
    config: TransportConfig,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Start the transport with the given MCP server.
    ///
    /// Returns once the client disconnects or `shutdown` completes.
    pub async fn run<S>(self, server: McpServer, shutdown: S) -> TransportResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        info!("Starting transport: {}", self.config.description());

        match self.config {
            #[cfg(feature = "stdio")]
            TransportConfig::Stdio => StdioTransport::run(server, shutdown).await,
        }
    }
}
