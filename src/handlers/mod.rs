pub mod admin;
pub mod public;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full HTTP surface: public endpoints plus the token-protected API.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .merge(admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
