//! Test utilities and fixtures for license manager integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;
use tempfile::TempDir;

pub use license_manager::context::RequestContext;
pub use license_manager::db::{DbPool, create_pool, init_db};
pub use license_manager::error::AppError;
pub use license_manager::handlers;
pub use license_manager::jwt::TokenIssuer;
pub use license_manager::lifecycle::LicenseEngine;
pub use license_manager::models::*;
pub use license_manager::repository::*;
pub use license_manager::state::AppState;

pub const TEST_JWT_SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

/// A SQLite database in a temp directory. Dropping it removes the file.
pub struct TestDb {
    pub dir: TempDir,
    pub pool: DbPool,
    pub store: Arc<SqliteStore>,
}

pub fn setup_test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("test.db");
    let pool = create_pool(path.to_str().expect("utf-8 path")).expect("Failed to create pool");
    {
        let conn = pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize schema");
    }
    let store = Arc::new(SqliteStore::new(pool.clone()));
    TestDb { dir, pool, store }
}

pub fn test_token_issuer() -> TokenIssuer {
    TokenIssuer::new(TEST_JWT_SECRET, 1).expect("valid test secret")
}

pub fn create_test_state(store: Arc<dyn Store>) -> AppState {
    AppState::new(store, test_token_issuer(), Duration::from_secs(5))
}

pub fn ctx() -> RequestContext {
    RequestContext::new()
}

pub fn json_map(value: Value) -> JsonMap {
    value.as_object().cloned().expect("expected a JSON object")
}

// ============ Fixtures ============

pub async fn create_test_application(state: &AppState, name: &str) -> CreatedApplication {
    state
        .applications
        .create(
            &ctx(),
            CreateApplication {
                name: name.to_string(),
                description: String::new(),
                version: "1.0".to_string(),
            },
        )
        .await
        .expect("Failed to create test application")
}

pub async fn create_test_license_type(
    state: &AppState,
    application_id: &str,
    duration_days: i32,
    features: Value,
) -> LicenseType {
    state
        .license_types
        .create(
            &ctx(),
            application_id,
            CreateLicenseType {
                name: "Pro".to_string(),
                description: String::new(),
                duration_days,
                price: 10.0,
                features: json_map(features),
                is_active: true,
            },
        )
        .await
        .expect("Failed to create test license type")
}

pub async fn create_test_client(state: &AppState, application_id: &str, email: &str) -> Client {
    state
        .clients
        .create(
            &ctx(),
            application_id,
            CreateClient {
                name: "Test Client".to_string(),
                email: email.to_string(),
                company: None,
                contact_person: None,
                phone: None,
                metadata: None,
            },
        )
        .await
        .expect("Failed to create test client")
}

/// Application, 30-day type with `features`, one client, one license.
pub struct Fixture {
    pub app: CreatedApplication,
    pub license_type: LicenseType,
    pub client: Client,
    pub license: License,
}

pub async fn create_fixture(state: &AppState, features: Value) -> Fixture {
    let app = create_test_application(state, "Test App").await;
    let license_type = create_test_license_type(state, &app.application.id, 30, features).await;
    let client = create_test_client(state, &app.application.id, "client@example.com").await;
    let license = state
        .engine
        .create(
            &ctx(),
            &app.application.id,
            CreateLicense {
                license_type_id: license_type.id.clone(),
                client_id: client.id.clone(),
                usage_limits: None,
            },
        )
        .await
        .expect("Failed to create test license");
    Fixture {
        app,
        license_type,
        client,
        license,
    }
}

// ============ HTTP helpers ============

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).expect("Response should be valid JSON")
}

// ============ Fault injection ============

/// Wraps a real store and fails selected operations on demand.
pub struct FaultyStore {
    pub inner: SqliteStore,
    pub fail_activities: AtomicBool,
    pub fail_record_check: AtomicBool,
    pub fail_revocation_write: AtomicBool,
    /// Number of upcoming `create_license` calls that report a key collision
    pub key_collisions: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            fail_activities: AtomicBool::new(false),
            fail_record_check: AtomicBool::new(false),
            fail_revocation_write: AtomicBool::new(false),
            key_collisions: AtomicUsize::new(0),
        }
    }

    fn injected() -> StoreError {
        StoreError::Task("injected failure".into())
    }
}

#[async_trait]
impl ApplicationRepository for FaultyStore {
    async fn create_application(&self, application: &Application) -> StoreResult<()> {
        self.inner.create_application(application).await
    }
    async fn get_application_by_id(&self, id: &str) -> StoreResult<Application> {
        self.inner.get_application_by_id(id).await
    }
    async fn get_application_by_api_key(&self, api_key: &str) -> StoreResult<Application> {
        self.inner.get_application_by_api_key(api_key).await
    }
    async fn list_applications(&self) -> StoreResult<Vec<Application>> {
        self.inner.list_applications().await
    }
    async fn update_application(&self, application: &Application) -> StoreResult<()> {
        self.inner.update_application(application).await
    }
    async fn delete_application(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_application(id).await
    }
    async fn count_applications(&self) -> StoreResult<i64> {
        self.inner.count_applications().await
    }
}

#[async_trait]
impl LicenseTypeRepository for FaultyStore {
    async fn create_license_type(&self, license_type: &LicenseType) -> StoreResult<()> {
        self.inner.create_license_type(license_type).await
    }
    async fn get_license_type_by_id(&self, id: &str) -> StoreResult<LicenseType> {
        self.inner.get_license_type_by_id(id).await
    }
    async fn list_license_types(&self, application_id: &str) -> StoreResult<Vec<LicenseType>> {
        self.inner.list_license_types(application_id).await
    }
    async fn update_license_type(&self, license_type: &LicenseType) -> StoreResult<()> {
        self.inner.update_license_type(license_type).await
    }
    async fn delete_license_type(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_license_type(id).await
    }
    async fn license_type_in_use(&self, id: &str) -> StoreResult<bool> {
        self.inner.license_type_in_use(id).await
    }
}

#[async_trait]
impl ClientRepository for FaultyStore {
    async fn create_client(&self, client: &Client) -> StoreResult<()> {
        self.inner.create_client(client).await
    }
    async fn get_client_by_id(&self, id: &str) -> StoreResult<Client> {
        self.inner.get_client_by_id(id).await
    }
    async fn list_clients(
        &self,
        application_id: &str,
        filters: &ClientFilters,
    ) -> StoreResult<Vec<Client>> {
        self.inner.list_clients(application_id, filters).await
    }
    async fn update_client(&self, client: &Client) -> StoreResult<()> {
        self.inner.update_client(client).await
    }
    async fn client_email_exists(
        &self,
        application_id: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<bool> {
        self.inner
            .client_email_exists(application_id, email, exclude_id)
            .await
    }
}

#[async_trait]
impl LicenseRepository for FaultyStore {
    async fn get_license_by_id(&self, id: &str) -> StoreResult<License> {
        self.inner.get_license_by_id(id).await
    }
    async fn get_license_by_key(&self, license_key: &str) -> StoreResult<License> {
        self.inner.get_license_by_key(license_key).await
    }
    async fn create_license(&self, license: &License) -> StoreResult<()> {
        let pending = self.key_collisions.load(Ordering::SeqCst);
        if pending > 0 {
            self.key_collisions.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::KeyCollision);
        }
        self.inner.create_license(license).await
    }
    async fn update_license(&self, license: &License) -> StoreResult<()> {
        self.inner.update_license(license).await
    }
    async fn update_usage(&self, id: &str, current_usage: &JsonMap) -> StoreResult<()> {
        self.inner.update_usage(id, current_usage).await
    }
    async fn record_check(&self, id: &str, checked_at: i64) -> StoreResult<()> {
        if self.fail_record_check.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.record_check(id, checked_at).await
    }
    async fn revoke_license(
        &self,
        id: &str,
        reason: &str,
        activity: &LicenseActivity,
    ) -> StoreResult<()> {
        if self.fail_revocation_write.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.revoke_license(id, reason, activity).await
    }
    async fn create_activity(&self, activity: &LicenseActivity) -> StoreResult<()> {
        if self.fail_activities.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.create_activity(activity).await
    }
    async fn list_activities_by_license(
        &self,
        license_id: &str,
    ) -> StoreResult<Vec<LicenseActivity>> {
        self.inner.list_activities_by_license(license_id).await
    }
    async fn list_licenses(&self, filters: &LicenseFilters) -> StoreResult<Vec<License>> {
        self.inner.list_licenses(filters).await
    }
    async fn has_active_licenses_for_client(&self, client_id: &str) -> StoreResult<bool> {
        self.inner.has_active_licenses_for_client(client_id).await
    }
}
