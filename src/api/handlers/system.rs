//! Landing page, health, readiness and metrics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::api::AppState;

/// Listing routes linked from the landing page.
const LANDING_LINKS: [&str; 8] = [
    "users",
    "allUsers",
    "allEvents",
    "allBookings",
    "allOrders",
    "events",
    "bookings",
    "orders",
];

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the store answered a ping.
    pub ready: bool,
}

/// `GET /`: landing page.
pub async fn landing() -> Html<String> {
    let mut page = String::from(
        r#"<h1 style="text-align:center;font-family:Monospace;">Asta Server Is Running...</h1>"#,
    );
    for link in LANDING_LINKS {
        page.push_str(&format!(
            r#"
<h2 style="text-align:center;font-family:Monospace;"><a href="/{link}">{link}</a></h2>"#
        ));
    }
    Html(page)
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if the store answers, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(ReadyResponse { ready: true })),
        Err(e) => {
            warn!("Store ping failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse { ready: false }),
            )
        }
    }
}

/// Prometheus text exposition, 404 when no recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
