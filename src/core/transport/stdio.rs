//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.

use std::future::Future;

use rmcp::transport::IntoTransport;
use rmcp::{RoleServer, ServiceExt};
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until the client disconnects or `shutdown`
    /// completes.
    pub async fn run<S>(server: McpServer, shutdown: S) -> TransportResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        info!("Ready - communicating via stdin/stdout");
        serve_until(server, rmcp::transport::stdio(), shutdown).await?;
        info!("STDIO transport finished");
        Ok(())
    }
}

/// Serve `server` over `transport` until the peer leaves or `shutdown`
/// completes.
///
/// `shutdown` is polled from the start, so a signal that arrives during the
/// initialize handshake ends the server cleanly as well.
pub(crate) async fn serve_until<T, E, A, S>(
    server: McpServer,
    transport: T,
    shutdown: S,
) -> TransportResult<()>
where
    T: IntoTransport<RoleServer, E, A>,
    E: std::error::Error + Send + Sync + 'static,
    S: Future<Output = ()> + Send + 'static,
{
    let mut shutdown = Box::pin(shutdown);

    let service = tokio::select! {
        served = server.serve(transport) => {
            served.map_err(|e| TransportError::init(e.to_string()))?
        }
        _ = &mut shutdown => {
            info!("Shutdown requested before the client finished initializing");
            return Ok(());
        }
    };

    let cancel = service.cancellation_token();
    let watcher = tokio::spawn(async move {
        shutdown.await;
        cancel.cancel();
    });

    let waited = service.waiting().await;
    watcher.abort();

    let quit_reason = waited.map_err(|e| TransportError::service(e.to_string()))?;
    info!("Service stopped: {:?}", quit_reason);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_during_handshake() {
        let server = McpServer::new(Config::default()).unwrap();
        // The client end stays open but never sends `initialize`.
        let (_client, server_io) = tokio::io::duplex(4096);

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            serve_until(server, server_io, async {}),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_signal() {
        let server = McpServer::new(Config::default()).unwrap();
        let (_client, server_io) = tokio::io::duplex(4096);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(serve_until(server, server_io, async move {
            let _ = rx.await;
        }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
