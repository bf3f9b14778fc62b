use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::util::extract_bearer_token;

/// The authenticated tenant, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct ApplicationContext {
    pub application_id: String,
    pub api_key: String,
}

/// Require a valid application bearer token.
///
/// The token must verify, and the application it names must still exist with
/// the same API key.
pub async fn app_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let claims = state.applications.tokens().verify(token)?;

    let ctx = state.ctx(request.headers());
    let application = state
        .applications
        .get(&ctx, &claims.application_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthorized,
            other => other,
        })?;
    if application.api_key != claims.api_key {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(ApplicationContext {
        application_id: application.id,
        api_key: application.api_key,
    });

    Ok(next.run(request).await)
}

