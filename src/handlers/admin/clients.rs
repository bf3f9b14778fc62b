use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
};

use crate::error::Result;
use crate::extractors::{Json, Path, Query};
use crate::middleware::ApplicationContext;
use crate::models::{Client, ClientFilters, CreateClient, License, UpdateClient};
use crate::state::AppState;

pub async fn create_client(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Json(input): Json<CreateClient>,
) -> Result<(StatusCode, Json<Client>)> {
    let ctx = state.ctx(&headers);
    let client = state.clients.create(&ctx, &app.application_id, input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn list_clients(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Query(filters): Query<ClientFilters>,
) -> Result<Json<Vec<Client>>> {
    let ctx = state.ctx(&headers);
    Ok(Json(
        state
            .clients
            .list(&ctx, &app.application_id, &filters)
            .await?,
    ))
}

pub async fn get_client(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Client>> {
    let ctx = state.ctx(&headers);
    Ok(Json(state.clients.get(&ctx, &app.application_id, &id).await?))
}

pub async fn update_client(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateClient>,
) -> Result<Json<Client>> {
    let ctx = state.ctx(&headers);
    Ok(Json(
        state
            .clients
            .update(&ctx, &app.application_id, &id, input)
            .await?,
    ))
}

/// Soft delete; 409 while the client still holds an active license.
pub async fn delete_client(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let ctx = state.ctx(&headers);
    state.clients.delete(&ctx, &app.application_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_client_licenses(
    State(state): State<AppState>,
    Extension(app): Extension<ApplicationContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<License>>> {
    let ctx = state.ctx(&headers);
    Ok(Json(
        state
            .clients
            .licenses(&ctx, &app.application_id, &id)
            .await?,
    ))
}
