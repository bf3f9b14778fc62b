//! Storage contract for the license manager.
//!
//! Services and the lifecycle engine only see these traits, so the SQLite
//! backend in [`sqlite`] can be swapped for anything else that honors them.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// A license key already exists. Retryable with a fresh key.
    #[error("License key collision")]
    KeyCollision,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Blocking task failed: {0}")]
    Task(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn create_application(&self, application: &Application) -> StoreResult<()>;

    async fn get_application_by_id(&self, id: &str) -> StoreResult<Application>;

    async fn get_application_by_api_key(&self, api_key: &str) -> StoreResult<Application>;

    async fn list_applications(&self) -> StoreResult<Vec<Application>>;

    async fn update_application(&self, application: &Application) -> StoreResult<()>;

    /// Removes the application and everything it owns.
    async fn delete_application(&self, id: &str) -> StoreResult<()>;

    async fn count_applications(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait LicenseTypeRepository: Send + Sync {
    async fn create_license_type(&self, license_type: &LicenseType) -> StoreResult<()>;

    async fn get_license_type_by_id(&self, id: &str) -> StoreResult<LicenseType>;

    async fn list_license_types(&self, application_id: &str) -> StoreResult<Vec<LicenseType>>;

    async fn update_license_type(&self, license_type: &LicenseType) -> StoreResult<()>;

    async fn delete_license_type(&self, id: &str) -> StoreResult<()>;

    /// True when any license still references the type.
    async fn license_type_in_use(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn create_client(&self, client: &Client) -> StoreResult<()>;

    async fn get_client_by_id(&self, id: &str) -> StoreResult<Client>;

    async fn list_clients(
        &self,
        application_id: &str,
        filters: &ClientFilters,
    ) -> StoreResult<Vec<Client>>;

    async fn update_client(&self, client: &Client) -> StoreResult<()>;

    /// Checks for another client in the application with the same (normalized) email.
    async fn client_email_exists(
        &self,
        application_id: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait LicenseRepository: Send + Sync {
    async fn get_license_by_id(&self, id: &str) -> StoreResult<License>;

    async fn get_license_by_key(&self, license_key: &str) -> StoreResult<License>;

    /// Fails with [`StoreError::KeyCollision`] when the key is already taken.
    async fn create_license(&self, license: &License) -> StoreResult<()>;

    /// Writes type, limits and the active flag, pruning usage for dropped metrics.
    ///
    /// Never touches revocation state. Marking a revoked license active fails
    /// with [`StoreError::Conflict`].
    async fn update_license(&self, license: &License) -> StoreResult<()>;

    /// Writes only `current_usage`.
    async fn update_usage(&self, id: &str, current_usage: &JsonMap) -> StoreResult<()>;

    /// Writes only `last_check`.
    async fn record_check(&self, id: &str, checked_at: i64) -> StoreResult<()>;

    /// Sets the revocation flags and reason and appends the activity in one transaction.
    async fn revoke_license(
        &self,
        id: &str,
        reason: &str,
        activity: &LicenseActivity,
    ) -> StoreResult<()>;

    async fn create_activity(&self, activity: &LicenseActivity) -> StoreResult<()>;

    async fn list_activities_by_license(&self, license_id: &str)
    -> StoreResult<Vec<LicenseActivity>>;

    async fn list_licenses(&self, filters: &LicenseFilters) -> StoreResult<Vec<License>>;

    /// True when the client holds at least one active, unrevoked license.
    async fn has_active_licenses_for_client(&self, client_id: &str) -> StoreResult<bool>;
}

/// Everything the services need from a backend.
pub trait Store:
    ApplicationRepository + LicenseTypeRepository + ClientRepository + LicenseRepository
{
}

impl<T> Store for T where
    T: ApplicationRepository + LicenseTypeRepository + ClientRepository + LicenseRepository
{
}
