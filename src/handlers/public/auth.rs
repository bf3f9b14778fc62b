use axum::{extract::State, http::HeaderMap};

use crate::error::Result;
use crate::extractors::Json;
use crate::models::{TokenRequest, TokenResponse};
use crate::state::AppState;

/// Exchange an application's API key and secret for a bearer token.
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    let ctx = state.ctx(&headers);
    let token = state.applications.generate_token(&ctx, &req).await?;
    Ok(Json(token))
}
