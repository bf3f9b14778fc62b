use axum::{extract::State, http::HeaderMap};
use serde::Serialize;

use crate::error::Result;
use crate::extractors::Json;
use crate::models::{UsageRequest, ValidateRequest, ValidationResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Validate a license key. Rejections come back as 403 with the same body shape.
pub async fn validate_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidationResult>> {
    let ctx = state.ctx(&headers);
    let result = state.engine.validate(&ctx, &req.license_key).await?;
    Ok(Json(result))
}

/// Report current usage for a license key.
pub async fn report_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UsageRequest>,
) -> Result<Json<UsageResponse>> {
    let ctx = state.ctx(&headers);
    state
        .engine
        .check_usage(&ctx, &req.license_key, &req.usage)
        .await?;
    Ok(Json(UsageResponse {
        success: true,
        message: "Usage recorded",
    }))
}
