use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
};

use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::ApplicationContext;
use crate::models::{CreateLicenseType, LicenseType, UpdateLicenseType};
use crate::state::AppState;

pub async fn create_license_type(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Json(input): Json<CreateLicenseType>,
) -> Result<(StatusCode, Json<LicenseType>)> {
    let ctx = state.ctx(&headers);
    let license_type = state
        .license_types
        .create(&ctx, &app.application_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(license_type)))
}

pub async fn list_license_types(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
) -> Result<Json<Vec<LicenseType>>> {
    let ctx = state.ctx(&headers);
    Ok(Json(state.license_types.list(&ctx, &app.application_id).await?))
}

pub async fn get_license_type(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<LicenseType>> {
    let ctx = state.ctx(&headers);
    Ok(Json(
        state.license_types.get(&ctx, &app.application_id, &id).await?,
    ))
}

pub async fn update_license_type(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateLicenseType>,
) -> Result<Json<LicenseType>> {
    let ctx = state.ctx(&headers);
    Ok(Json(
        state
            .license_types
            .update(&ctx, &app.application_id, &id, input)
            .await?,
    ))
}

pub async fn delete_license_type(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let ctx = state.ctx(&headers);
    state
        .license_types
        .delete(&ctx, &app.application_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
