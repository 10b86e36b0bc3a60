use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::state::SharedState;

pub const ONLINE_BANNER: &str = "Velox AI online.";
const ACK: &str = "OK";

/// Largest update body read. Real updates are a few KiB; anything larger is
/// dropped and still acknowledged.
pub const MAX_UPDATE_BYTES: usize = 1024 * 1024;

/// Telegram webhook endpoint. Always answers 200 so Telegram never retries.
pub async fn telegram_webhook(
    State(state): State<SharedState>,
    method: Method,
    body: Body,
) -> (StatusCode, &'static str) {
    if method != Method::POST {
        return (StatusCode::OK, ONLINE_BANNER);
    }

    let body = match to_bytes(body, MAX_UPDATE_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            warn!("dropping webhook body over {MAX_UPDATE_BYTES} bytes: {e}");
            return (StatusCode::OK, ACK);
        }
    };

    let update: Value = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            debug!("ignoring webhook body that is not JSON: {e}");
            return (StatusCode::OK, ACK);
        }
    };

    // Run in its own task so a panic is contained to this update.
    let dispatcher = Arc::clone(&state.dispatcher);
    let handle = tokio::spawn(async move { dispatcher.dispatch(&update).await });

    match handle.await {
        Ok(Ok(outcome)) => debug!(?outcome, "update handled"),
        Ok(Err(e)) => error!("failed to handle update: {e}"),
        Err(e) => error!("update handler panicked: {e}"),
    }

    (StatusCode::OK, ACK)
}
