use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;

use crate::context::RequestContext;
use crate::jwt::TokenIssuer;
use crate::lifecycle::LicenseEngine;
use crate::repository::Store;
use crate::services::{ApplicationService, ClientService, LicenseTypeService};
use crate::util::request_context;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LicenseEngine>,
    pub applications: Arc<ApplicationService>,
    pub license_types: Arc<LicenseTypeService>,
    pub clients: Arc<ClientService>,
    /// Upper bound on how long a request may wait on storage reads
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer, request_timeout: Duration) -> Self {
        Self {
            engine: Arc::new(LicenseEngine::new(store.clone())),
            applications: Arc::new(ApplicationService::new(store.clone(), tokens)),
            license_types: Arc::new(LicenseTypeService::new(store.clone())),
            clients: Arc::new(ClientService::new(store)),
            request_timeout,
        }
    }

    /// Per-request context carrying caller info and the configured timeout.
    pub fn ctx(&self, headers: &HeaderMap) -> RequestContext {
        request_context(headers, self.request_timeout)
    }
}
