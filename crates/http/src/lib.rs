//! Loopback HTTP/JSON adapter.
//!
//! A uniform façade over the storage core for plugins and dashboards that
//! prefer HTTP to MCP. The process trusts its callers: the server binds
//! loopback only and applies no authentication.

mod api_error;
mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use engram_storage::Storage;

pub use api_error::ApiError;

pub struct AppState {
    pub storage: Storage,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/{id}/end", post(handlers::end_session))
        .route(
            "/observations",
            post(handlers::add_observation).get(handlers::list_observations),
        )
        .route("/observations/passive", post(handlers::passive_capture))
        .route(
            "/observations/{id}",
            get(handlers::get_observation)
                .patch(handlers::update_observation)
                .delete(handlers::delete_observation),
        )
        .route("/prompts", post(handlers::add_prompt))
        .route("/prompts/search", get(handlers::search_prompts))
        .route("/search", get(handlers::search))
        .route("/context", get(handlers::context))
        .route("/timeline/{id}", get(handlers::timeline))
        .route("/stats", get(handlers::stats))
        .with_state(state)
}

/// Serves the API on `127.0.0.1:port` until the process exits.
pub async fn serve(storage: Storage, port: u16) -> std::io::Result<()> {
    let state = Arc::new(AppState { storage });
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!(port, "HTTP server listening on loopback");
    axum::serve(listener, router).await
}
