//! HTTP API for git-agent.
//!
//! ## Endpoints
//!
//! - `GET /` - Health check, returns `Home route`
//! - `POST /chat` - Ask the agent a question about the repository
//!
//! The MCP server is connected before the listener binds and cleaned up once
//! the server has drained after a shutdown signal.

mod error;
mod routes;
pub mod types;

pub use error::ApiError;
pub use routes::{router, AppState};

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::mcp::McpConnection;

/// Connect the MCP server, serve HTTP until shutdown, then clean up.
///
/// A failed connect is fatal: the connection is cleaned up and the error is
/// returned before anything binds.
pub async fn serve(
    config: &Config,
    state: Arc<AppState>,
    connection: Arc<McpConnection>,
) -> anyhow::Result<()> {
    serve_with_shutdown(config, state, connection, shutdown_signal()).await
}

/// Like [`serve`], but stops when `shutdown` resolves instead of on a signal.
pub async fn serve_with_shutdown<F>(
    config: &Config,
    state: Arc<AppState>,
    connection: Arc<McpConnection>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Err(e) = connection.connect().await {
        connection.cleanup().await;
        return Err(e).context("failed to connect to the git MCP server");
    }

    let result = run_server(config, state, shutdown).await;
    connection.cleanup().await;
    result
}

async fn run_server<F>(config: &Config, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    info!("Listening on {}", listener.local_addr().map(|a| a.to_string()).unwrap_or(addr));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failure")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
