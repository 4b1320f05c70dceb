//! MCP Server Entry Point
//!
//! Loads configuration, initializes logging, builds the tool registry and
//! serves it over the configured transport until the client disconnects or a
//! termination signal arrives.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use envio_mcp_server::core::{Config, McpServer, TransportService, shutdown_signal};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level);
    install_panic_hook();

    match run(config).await {
        Ok(()) => {
            info!("Server shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    info!("Starting {} v{}", config.server.name, config.server.version);

    let transport = TransportService::new(config.transport.clone());

    // Create the MCP server
    let server = McpServer::new(config).context("Failed to register tools")?;

    info!(
        "Server initialized with {} tools: {}",
        server.registry().len(),
        server.registry().tool_names().join(", ")
    );

    transport
        .run(server, shutdown_signal())
        .await
        .context("Transport failed")?;

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout carries the protocol.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Record panics through `tracing` instead of printing to stderr directly.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!("Panic at {}: {}", location, message);
    }));
}
