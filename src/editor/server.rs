use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, header},
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;

use super::api::{self, AppState};
use crate::config::EditorConfig;

/// Build the full application router with no-cache headers and request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::editor_router()
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Start the editor server and block until Ctrl+C.
pub async fn start_server(config: EditorConfig, open_browser: bool) -> Result<()> {
    let config = Arc::new(config);
    info!("Using doc root at {}", config.doc_root.display());

    let state = Arc::new(AppState::with_shell(config.clone()));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!("Editor running at http://{}", local_addr);

    if open_browser {
        let url = format!("http://{}", local_addr);
        tokio::spawn(async move {
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        });
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
