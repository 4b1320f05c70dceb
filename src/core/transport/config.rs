//! Transport configuration types.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Transport configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            Self::Stdio
        }

        #[cfg(not(feature = "stdio"))]
        {
            compile_error!("The stdio transport feature must be enabled");
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Load transport config from `MCP_TRANSPORT`.
    ///
    /// Unknown values are logged and replaced by the default transport.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "stdio")]
            "" | "stdio" => Self::Stdio,
            other => {
                warn!("Unsupported transport '{}', falling back to STDIO", other);
                Self::default()
            }
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}
