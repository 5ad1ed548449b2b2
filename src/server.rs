//! MCP server initialization for stdio and HTTP transports.
//!
//! Provides [`serve`], which dispatches on the configured transport, plus the
//! [`serve_stdio`] and [`serve_http`] entry points that wire the tool handler into a
//! running server.

use crate::config::LoreConfig;
use crate::tools::LoreTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;

/// Shared setup: check the lore directory and wrap the config for sharing.
fn setup_shared_state(config: LoreConfig) -> Arc<LoreConfig> {
    let lore_dir = config.resolved_lore_dir();
    if lore_dir.is_dir() {
        tracing::info!(lore_dir = %lore_dir.display(), "lore directory ready");
    } else {
        tracing::warn!(
            lore_dir = %lore_dir.display(),
            "lore directory missing, tools will see an empty catalog until it exists"
        );
    }
    Arc::new(config)
}

/// Start the MCP server on the transport named in `[server].transport`.
pub async fn serve(config: LoreConfig) -> Result<()> {
    match config.server.transport.as_str() {
        "stdio" => serve_stdio(config).await,
        "http" => serve_http(config).await,
        other => anyhow::bail!("unknown transport: {other}. Supported: stdio, http"),
    }
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: LoreConfig) -> Result<()> {
    tracing::info!("starting loregraph MCP server on stdio");

    let config = setup_shared_state(config);

    let tools = LoreTools::new(config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: LoreConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting loregraph MCP server on HTTP");

    let config = setup_shared_state(config);

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(LoreTools::new(config.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
