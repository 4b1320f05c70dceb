//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Envio generator configuration for the scaffolding tool.
    pub envio: EnvioConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration of the external `envio init` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvioConfig {
    /// Program and leading arguments, e.g. `["npx", "envio", "init"]`.
    pub command: Vec<String>,

    /// Timeout for a single attempt, in seconds.
    pub timeout_secs: u64,

    /// Directory holding projects created without an explicit output
    /// directory. `None` means `<home>/envio`.
    pub base_dir: Option<PathBuf>,

    /// Delay before the fallback attempt starts pressing Enter.
    pub keystroke_delay_ms: u64,

    /// Pause between two simulated Enter presses.
    pub keystroke_interval_ms: u64,

    /// Number of simulated Enter presses.
    pub keystroke_count: usize,
}

impl EnvioConfig {
    /// Directory default project directories are created in.
    pub fn projects_dir(&self) -> Option<PathBuf> {
        self.base_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join("envio")))
    }
}

impl Default for EnvioConfig {
    fn default() -> Self {
        Self {
            command: vec!["npx".to_string(), "envio".to_string(), "init".to_string()],
            timeout_secs: 300,
            base_dir: None,
            keystroke_delay_ms: 2000,
            keystroke_interval_ms: 500,
            keystroke_count: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "envio-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            envio: EnvioConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        if let Ok(command) = std::env::var("MCP_ENVIO_COMMAND") {
            let parts: Vec<String> = command.split_whitespace().map(String::from).collect();
            if parts.is_empty() {
                warn!("MCP_ENVIO_COMMAND is empty, keeping default command");
            } else {
                info!("Envio command set to: {}", parts.join(" "));
                config.envio.command = parts;
            }
        }

        if let Ok(base_dir) = std::env::var("MCP_ENVIO_BASE_DIR") {
            config.envio.base_dir = Some(PathBuf::from(base_dir));
        }

        config.envio.timeout_secs =
            parse_env("MCP_ENVIO_TIMEOUT_SECS", config.envio.timeout_secs);
        config.envio.keystroke_delay_ms =
            parse_env("MCP_ENVIO_KEYSTROKE_DELAY_MS", config.envio.keystroke_delay_ms);
        config.envio.keystroke_interval_ms = parse_env(
            "MCP_ENVIO_KEYSTROKE_INTERVAL_MS",
            config.envio.keystroke_interval_ms,
        );
        config.envio.keystroke_count =
            parse_env("MCP_ENVIO_KEYSTROKE_COUNT", config.envio.keystroke_count);

        config
    }
}

/// Read a numeric variable, falling back to `default` when unset or invalid.
fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using {}", raw, key, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_envio_defaults() {
        let config = Config::default();
        assert_eq!(config.envio.command, vec!["npx", "envio", "init"]);
        assert_eq!(config.envio.timeout_secs, 300);
        assert!(config.envio.base_dir.is_none());
    }

    #[test]
    fn test_envio_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_ENVIO_COMMAND", "pnpx envio init");
            std::env::set_var("MCP_ENVIO_TIMEOUT_SECS", "42");
            std::env::set_var("MCP_ENVIO_BASE_DIR", "/srv/indexers");
        }
        let config = Config::from_env();
        assert_eq!(config.envio.command, vec!["pnpx", "envio", "init"]);
        assert_eq!(config.envio.timeout_secs, 42);
        assert_eq!(
            config.envio.projects_dir(),
            Some(PathBuf::from("/srv/indexers"))
        );
        unsafe {
            std::env::remove_var("MCP_ENVIO_COMMAND");
            std::env::remove_var("MCP_ENVIO_TIMEOUT_SECS");
            std::env::remove_var("MCP_ENVIO_BASE_DIR");
        }
    }

    #[test]
    fn test_invalid_number_falls_back() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_ENVIO_KEYSTROKE_COUNT", "many");
        }
        let config = Config::from_env();
        assert_eq!(config.envio.keystroke_count, 20);
        unsafe {
            std::env::remove_var("MCP_ENVIO_KEYSTROKE_COUNT");
        }
    }

    #[test]
    fn test_default_projects_dir_under_home() {
        let config = EnvioConfig::default();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.projects_dir(), Some(home.join("envio")));
        }
    }
}
