use crate::dispatcher::{SubmitError, UpdateQueue};
use crate::telegram::Update;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct AppState {
    pub queue: UpdateQueue,
    /// Expected value of the secret token header, if one was registered
    pub webhook_secret: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the webhook until `shutdown` resolves
pub async fn serve<F>(state: AppState, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("✓ Webhook server listening on port {}", port);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Webhook server failed")
}

async fn health() -> &'static str {
    "OK"
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(expected) = &state.webhook_secret {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !secrets_match(provided, expected) {
            warn!("Rejected webhook call with invalid secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    // Never wait on a full partition; Telegram redelivers on non-2xx
    match state.queue.try_submit(update) {
        Ok(()) => StatusCode::OK,
        Err(e @ SubmitError::Full(_)) => {
            warn!("Rejected webhook update: {}", e);
            StatusCode::TOO_MANY_REQUESTS
        }
        Err(e @ SubmitError::Closed(_)) => {
            error!("Failed to enqueue update: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Constant-time comparison for the webhook secret
fn secrets_match(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}
