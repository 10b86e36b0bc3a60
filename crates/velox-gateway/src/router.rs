use axum::Router;
use axum::routing::{any, get};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;
use crate::webhook::telegram_webhook;

/// Build the main application router with all routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", any(telegram_webhook))
        .route("/webhook", any(telegram_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

