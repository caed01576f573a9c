//! HTTP JSON API for Focus Mode sessions.
//!
//! Endpoints:
//! - GET  /health  - Server status
//! - POST /start   - Open a session record
//! - POST /end     - Close a session record
//! - GET  /stats   - Dashboard numbers for a user and range
//! - POST /export  - CSV download or base64-encoded PDF
//!
//! All error responses are JSON `{"error": "..."}`.

mod error;
mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use focusmode_core::{SessionService, SessionStore};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;

use self::handlers::{
    handle_end, handle_export, handle_health, handle_not_found, handle_start, handle_stats,
};

/// Shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions: SessionService::new(store),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/start", post(handle_start))
        .route("/end", post(handle_end))
        .route("/stats", get(handle_stats))
        .route("/export", post(handle_export))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "focusmode server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server shut down");
    Ok(())
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
