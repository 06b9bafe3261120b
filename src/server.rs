use rmcp::ServiceExt;
use rmcp::transport::sse_server::SseServer;
use rmcp::transport::stdio;
use std::sync::Arc;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt};

use crate::catalog::CatalogService;
use crate::mcp::CatalogTools;

/// Logging for the SSE server: env filter (default `debug`) and fmt layer on stdout.
pub fn init_sse_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Logging for stdio mode and one-shot calls. Writes to stderr without ANSI so
/// stdout carries only protocol or result data.
pub fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

// start sse server
pub async fn start_sse_server(addr: &str, service: Arc<CatalogService>) -> anyhow::Result<()> {
    tracing::info!("Serving catalog from {}", service.cache().source());
    let ct = SseServer::serve(addr.parse()?)
        .await?
        .with_service(move || CatalogTools::new(service.clone()));

    tracing::info!("SSE server listening on {}", addr);
    tokio::signal::ctrl_c().await?;
    ct.cancel();
    Ok(())
}

// start stdio server
pub async fn start_stdio_server(service: Arc<CatalogService>) -> anyhow::Result<()> {
    tracing::info!(
        "Starting MCP server on stdio, catalog source {}",
        service.cache().source()
    );

    let running = CatalogTools::new(service)
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })?;

    running.waiting().await?;
    Ok(())
}
