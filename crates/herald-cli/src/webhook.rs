//! Inbound webhook server.
//!
//! One POST endpoint fed by the media server's webhook plugin, plus a health
//! probe. Each request is reconciled synchronously and answered with a
//! diagnostic line; failures are scoped to the request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use herald_core::{Engine, Outcome};
use herald_models::WebhookPayload;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}

async fn handle_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse {
    match state.engine.handle_webhook(&payload).await {
        Ok(outcome) => (StatusCode::OK, describe(&outcome).to_string()),
        Err(e) => {
            error!(error = %e, "Webhook reconciliation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("reconciliation failed: {e:#}"),
            )
        }
    }
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn describe(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::New => "announced as new",
        Outcome::QualityUpdate => "announced quality update",
        Outcome::SeasonProgress { .. } => "announced season progress",
        Outcome::Suppressed => "suppressed (quality update just announced)",
        Outcome::AlreadyAnnounced => "already announced",
        Outcome::Baseline => "recorded without announcing",
        Outcome::Skipped(reason) => reason,
    }
}
