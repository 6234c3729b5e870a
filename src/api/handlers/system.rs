//! System endpoints: health check.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy`, or `read_only` when serving a legacy schema.
    status: &'static str,
    /// Store backend: `postgres` or `memory`.
    store: &'static str,
    /// Detected ticket schema, absent for the in-memory store.
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    /// Whether issuance, cancellation and check-in are accepted.
    writable: bool,
    timestamp: String,
    version: &'static str,
}

/// `GET /health` — Service health and storage mode.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Reports the store backend, the ticket schema detected at startup and whether writes are accepted. A legacy schema is served read-only.",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.storage;
    let writable = storage.is_writable();
    Json(HealthResponse {
        status: if writable { "healthy" } else { "read_only" },
        store: storage.backend.as_str(),
        schema: storage.schema.map(|s| s.to_string()),
        writable,
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
