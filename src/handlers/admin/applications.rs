use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
};

use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::ApplicationContext;
use crate::models::{Application, CreateApplication, CreatedApplication, UpdateApplication};
use crate::state::AppState;

/// A token only grants access to its own application record.
fn ensure_self(app: &ApplicationContext, id: &str) -> Result<()> {
    if app.application_id != id {
        return Err(AppError::NotFound("Application not found".into()));
    }
    Ok(())
}

pub async fn create_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateApplication>,
) -> Result<(StatusCode, Json<CreatedApplication>)> {
    let ctx = state.ctx(&headers);
    let created = state.applications.create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
) -> Result<Json<Vec<Application>>> {
    let ctx = state.ctx(&headers);
    let application = state.applications.get(&ctx, &app.application_id).await?;
    Ok(Json(vec![application]))
}

pub async fn get_application(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Application>> {
    ensure_self(&app, &id)?;
    let ctx = state.ctx(&headers);
    Ok(Json(state.applications.get(&ctx, &id).await?))
}

pub async fn update_application(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateApplication>,
) -> Result<Json<Application>> {
    ensure_self(&app, &id)?;
    let ctx = state.ctx(&headers);
    Ok(Json(state.applications.update(&ctx, &id, input).await?))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    ensure_self(&app, &id)?;
    let ctx = state.ctx(&headers);
    state.applications.delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
