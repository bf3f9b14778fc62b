use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
};

use crate::context::RequestContext;
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::ApplicationContext;
use crate::models::{
    CreateLicense, License, LicenseActivity, LicenseFilters, RevokeLicense, UpdateLicense,
};
use crate::state::AppState;

/// Load a license by ID, hiding licenses that belong to other applications.
async fn owned_license(
    state: &AppState,
    ctx: &RequestContext,
    app: &ApplicationContext,
    id: &str,
) -> Result<License> {
    let license = state.engine.get_by_id(ctx, id).await?;
    if license.application_id != app.application_id {
        return Err(AppError::NotFound("License not found".into()));
    }
    Ok(license)
}

pub async fn create_license(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Json(input): Json<CreateLicense>,
) -> Result<(StatusCode, Json<License>)> {
    let ctx = state.ctx(&headers);
    let license = state
        .engine
        .create(&ctx, &app.application_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(license)))
}

pub async fn list_licenses(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Query(mut filters): Query<LicenseFilters>,
) -> Result<Json<Vec<License>>> {
    let ctx = state.ctx(&headers);
    filters.application_id = app.application_id;
    Ok(Json(state.engine.list(&ctx, &filters).await?))
}

pub async fn get_license(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<License>> {
    let ctx = state.ctx(&headers);
    Ok(Json(owned_license(&state, &ctx, &app, &id).await?))
}

pub async fn get_license_by_key(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<License>> {
    let ctx = state.ctx(&headers);
    let license = state.engine.get_by_key(&ctx, &key).await?;
    if license.application_id != app.application_id {
        return Err(AppError::NotFound("License not found".into()));
    }
    Ok(Json(license))
}

pub async fn update_license(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateLicense>,
) -> Result<Json<License>> {
    let ctx = state.ctx(&headers);
    owned_license(&state, &ctx, &app, &id).await?;
    Ok(Json(state.engine.update(&ctx, &id, input).await?))
}

pub async fn revoke_license(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<RevokeLicense>,
) -> Result<Json<License>> {
    let ctx = state.ctx(&headers);
    owned_license(&state, &ctx, &app, &id).await?;
    state.engine.revoke(&ctx, &id, &input.reason).await?;
    Ok(Json(state.engine.get_by_id(&ctx, &id).await?))
}

pub async fn list_license_activities(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<LicenseActivity>>> {
    let ctx = state.ctx(&headers);
    owned_license(&state, &ctx, &app, &id).await?;
    Ok(Json(state.engine.activities(&ctx, &id).await?))
}
