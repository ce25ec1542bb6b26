use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::AppState;

/// Health check endpoint response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub consecutive_login_failures: u32,
}

impl HealthResponse {
    fn from_failures(consecutive_login_failures: u32) -> (StatusCode, Self) {
        let (code, status) = if consecutive_login_failures == 0 {
            (StatusCode::OK, "ok")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        };
        (
            code,
            Self {
                status: status.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                consecutive_login_failures,
            },
        )
    }
}

/// GET /health
///
/// Reports "ok" while the session refreshes cleanly and "degraded" with
/// `503` while logins keep failing.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.session.stats();
    let (code, response) = HealthResponse::from_failures(stats.consecutive_failures);
    (code, Json(response))
}
