//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating tool listing and tool calls to the [`ToolRegistry`].
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool
//! and registered in `build_registry()`.
//! **Adding a new tool does NOT require modifying this file!**

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use super::error::Result;
use crate::domains::tools::{ToolRegistry, build_registry};

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp. Cloning is
/// cheap: the configuration and the registry are shared.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registered tools, read-only after startup.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with all built-in tools registered.
    ///
    /// Fails if any tool cannot be registered.
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let registry = build_registry(config.clone())?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create a server around an already built registry.
    pub fn with_registry(config: Arc<Config>, registry: ToolRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Get the tool registry.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Provides a calculator, text statistics (word_count, char_count) and \
                 envio_init_indexer, which scaffolds a new Envio indexer project."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.registry.list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("Calling tool: {}", request.name);
        Ok(self
            .registry
            .dispatch(&request.name, request.arguments)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_registers_all_tools() {
        let server = McpServer::new(Config::default()).unwrap();
        assert_eq!(server.registry().len(), 4);
        assert_eq!(server.name(), "envio-mcp-server");
        assert_eq!(server.version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_server_info_advertises_tools_only() {
        let server = McpServer::new(Config::default()).unwrap();
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
        assert!(info.instructions.unwrap().contains("envio_init_indexer"));
    }

    #[test]
    fn test_server_info_reports_configured_identity() {
        let mut config = Config::default();
        config.server.name = "indexer-helper".to_string();
        let server = McpServer::new(config).unwrap();

        let info = server.get_info();
        assert_eq!(info.server_info.name, "indexer-helper");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));

        let default_info = McpServer::new(Config::default()).unwrap().get_info();
        assert_eq!(default_info.server_info.name, "envio-mcp-server");
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let server = McpServer::new(Config::default()).unwrap();
        let clone = server.clone();
        assert!(Arc::ptr_eq(&server.registry, &clone.registry));

        let result = clone
            .registry()
            .dispatch(
                "calculate",
                serde_json::json!({ "a": 2, "b": 2, "operation": "multiply" })
                    .as_object()
                    .cloned(),
            )
            .await;
        assert_eq!(result.is_error, Some(false));
    }
}
