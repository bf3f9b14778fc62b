mod applications;
mod clients;
mod license_types;
mod licenses;

pub use applications::*;
pub use clients::*;
pub use license_types::*;
pub use licenses::*;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::app_auth;
use crate::state::AppState;

/// Routes that require an application bearer token.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // Applications
        .route("/api/v1/applications", post(create_application).get(list_applications))
        .route(
            "/api/v1/applications/{id}",
            get(get_application)
                .put(update_application)
                .delete(delete_application),
        )
        // License types
        .route("/api/v1/license-types", post(create_license_type).get(list_license_types))
        .route(
            "/api/v1/license-types/{id}",
            get(get_license_type)
                .put(update_license_type)
                .delete(delete_license_type),
        )
        // Clients
        .route("/api/v1/clients", post(create_client).get(list_clients))
        .route(
            "/api/v1/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/api/v1/clients/{id}/licenses", get(list_client_licenses))
        // Licenses
        .route("/api/v1/licenses", post(create_license).get(list_licenses))
        .route("/api/v1/licenses/by-key/{key}", get(get_license_by_key))
        .route("/api/v1/licenses/{id}", get(get_license).put(update_license))
        .route("/api/v1/licenses/{id}/revoke", post(revoke_license))
        .route("/api/v1/licenses/{id}/activities", get(list_license_activities))
        .layer(middleware::from_fn_with_state(state, app_auth))
}
