mod auth;
mod validate;

pub use auth::*;
pub use validate::*;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/auth/token", post(issue_token))
        .route("/api/v1/validate", post(validate_license))
        .route("/api/v1/usage", post(report_usage))
}
