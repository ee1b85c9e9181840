//! Streamable HTTP transport.

use std::net::SocketAddr;

use axum::{Json, Router, routing::get};
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{McpServer, ServeError};
use crate::tools::ToolRegistry;

/// MCP service that can be nested into an axum router.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use highlevel_mcp::client::{ApiContext, HttpTransport};
/// # use highlevel_mcp::config::{Config, ConfigOverrides};
/// # use highlevel_mcp::mcp::create_mcp_service;
/// # use highlevel_mcp::tools::ToolRegistry;
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::resolve(ConfigOverrides::default())?;
/// let transport = HttpTransport::new(&config)?;
/// let registry = ToolRegistry::new(Arc::new(ApiContext::from_config(transport, &config)));
///
/// let app: axum::Router = axum::Router::new()
///     .nest_service("/mcp", create_mcp_service(registry, Default::default()));
/// # Ok(())
/// # }
/// ```
pub fn create_mcp_service(
    registry: ToolRegistry,
    cancellation_token: CancellationToken,
) -> StreamableHttpService<McpServer, LocalSessionManager> {
    // One server per session; they all share the registry.
    let service_factory = move || -> Result<McpServer, std::io::Error> {
        Ok(McpServer::new(registry.clone()))
    };

    let config = StreamableHttpServerConfig::default()
        .with_stateful_mode(true)
        .with_cancellation_token(cancellation_token);

    StreamableHttpService::new(
        service_factory,
        LocalSessionManager::default().into(),
        config,
    )
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `/mcp` plus `/health`, with request tracing.
pub fn router(registry: ToolRegistry, cancellation_token: CancellationToken) -> Router {
    Router::new()
        .nest_service("/mcp", create_mcp_service(registry, cancellation_token))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

/// Serve over HTTP until Ctrl-C.
pub async fn serve_http(registry: ToolRegistry, addr: SocketAddr) -> Result<(), ServeError> {
    let ct = CancellationToken::new();
    let tools = registry.len();
    let app = router(registry, ct.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(%addr, tools, "MCP server listening on http://{addr}/mcp");

    let shutdown = ct.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("shutting down");
            shutdown.cancel();
        })
        .await
        .map_err(|source| ServeError::Http { source })
}
