use async_trait::async_trait;
use rusqlite::Connection;

use super::*;
use crate::db::{DbPool, queries};

/// SQLite-backed store. Every call borrows a pooled connection on the
/// blocking thread pool so the async runtime never waits on disk I/O.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Turn a missing row into `NotFound`.
fn found<T>(value: Option<T>) -> StoreResult<T> {
    value.ok_or(StoreError::NotFound)
}

/// Turn a zero-row write into `NotFound`.
fn matched(updated: bool) -> StoreResult<()> {
    if updated {
        Ok(())
    } else {
        Err(StoreError::NotFound)
    }
}

#[async_trait]
impl ApplicationRepository for SqliteStore {
    async fn create_application(&self, application: &Application) -> StoreResult<()> {
        let application = application.clone();
        self.run(move |conn| queries::create_application(conn, &application))
            .await
    }

    async fn get_application_by_id(&self, id: &str) -> StoreResult<Application> {
        let id = id.to_string();
        self.run(move |conn| found(queries::get_application_by_id(conn, &id)?))
            .await
    }

    async fn get_application_by_api_key(&self, api_key: &str) -> StoreResult<Application> {
        let api_key = api_key.to_string();
        self.run(move |conn| found(queries::get_application_by_api_key(conn, &api_key)?))
            .await
    }

    async fn list_applications(&self) -> StoreResult<Vec<Application>> {
        self.run(|conn| queries::list_applications(conn)).await
    }

    async fn update_application(&self, application: &Application) -> StoreResult<()> {
        let application = application.clone();
        self.run(move |conn| matched(queries::update_application(conn, &application)?))
            .await
    }

    async fn delete_application(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.run(move |conn| matched(queries::delete_application(conn, &id)?))
            .await
    }

    async fn count_applications(&self) -> StoreResult<i64> {
        self.run(|conn| queries::count_applications(conn)).await
    }
}

#[async_trait]
impl LicenseTypeRepository for SqliteStore {
    async fn create_license_type(&self, license_type: &LicenseType) -> StoreResult<()> {
        let license_type = license_type.clone();
        self.run(move |conn| queries::create_license_type(conn, &license_type))
            .await
    }

    async fn get_license_type_by_id(&self, id: &str) -> StoreResult<LicenseType> {
        let id = id.to_string();
        self.run(move |conn| found(queries::get_license_type_by_id(conn, &id)?))
            .await
    }

    async fn list_license_types(&self, application_id: &str) -> StoreResult<Vec<LicenseType>> {
        let application_id = application_id.to_string();
        self.run(move |conn| queries::list_license_types(conn, &application_id))
            .await
    }

    async fn update_license_type(&self, license_type: &LicenseType) -> StoreResult<()> {
        let license_type = license_type.clone();
        self.run(move |conn| matched(queries::update_license_type(conn, &license_type)?))
            .await
    }

    async fn delete_license_type(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.run(move |conn| matched(queries::delete_license_type(conn, &id)?))
            .await
    }

    async fn license_type_in_use(&self, id: &str) -> StoreResult<bool> {
        let id = id.to_string();
        self.run(move |conn| queries::license_type_in_use(conn, &id))
            .await
    }
}

#[async_trait]
impl ClientRepository for SqliteStore {
    async fn create_client(&self, client: &Client) -> StoreResult<()> {
        let client = client.clone();
        self.run(move |conn| queries::create_client(conn, &client))
            .await
    }

    async fn get_client_by_id(&self, id: &str) -> StoreResult<Client> {
        let id = id.to_string();
        self.run(move |conn| found(queries::get_client_by_id(conn, &id)?))
            .await
    }

    async fn list_clients(
        &self,
        application_id: &str,
        filters: &ClientFilters,
    ) -> StoreResult<Vec<Client>> {
        let application_id = application_id.to_string();
        let filters = filters.clone();
        self.run(move |conn| queries::list_clients(conn, &application_id, &filters))
            .await
    }

    async fn update_client(&self, client: &Client) -> StoreResult<()> {
        let client = client.clone();
        self.run(move |conn| matched(queries::update_client(conn, &client)?))
            .await
    }

    async fn client_email_exists(
        &self,
        application_id: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<bool> {
        let application_id = application_id.to_string();
        let email = email.to_string();
        let exclude_id = exclude_id.map(str::to_string);
        self.run(move |conn| {
            queries::client_email_exists(conn, &application_id, &email, exclude_id.as_deref())
        })
        .await
    }
}

#[async_trait]
impl LicenseRepository for SqliteStore {
    async fn get_license_by_id(&self, id: &str) -> StoreResult<License> {
        let id = id.to_string();
        self.run(move |conn| found(queries::get_license_by_id(conn, &id)?))
            .await
    }

    async fn get_license_by_key(&self, license_key: &str) -> StoreResult<License> {
        let license_key = license_key.to_string();
        self.run(move |conn| found(queries::get_license_by_key(conn, &license_key)?))
            .await
    }

    async fn create_license(&self, license: &License) -> StoreResult<()> {
        let license = license.clone();
        self.run(move |conn| queries::create_license(conn, &license))
            .await
    }

    async fn update_license(&self, license: &License) -> StoreResult<()> {
        let license = license.clone();
        self.run(move |conn| matched(queries::update_license(conn, &license)?))
            .await
    }

    async fn update_usage(&self, id: &str, current_usage: &JsonMap) -> StoreResult<()> {
        let id = id.to_string();
        let current_usage = current_usage.clone();
        self.run(move |conn| matched(queries::update_usage(conn, &id, &current_usage)?))
            .await
    }

    async fn record_check(&self, id: &str, checked_at: i64) -> StoreResult<()> {
        let id = id.to_string();
        self.run(move |conn| matched(queries::record_check(conn, &id, checked_at)?))
            .await
    }

    async fn revoke_license(
        &self,
        id: &str,
        reason: &str,
        activity: &LicenseActivity,
    ) -> StoreResult<()> {
        let id = id.to_string();
        let reason = reason.to_string();
        let activity = activity.clone();
        self.run(move |conn| matched(queries::revoke_license(conn, &id, &reason, &activity)?))
            .await
    }

    async fn create_activity(&self, activity: &LicenseActivity) -> StoreResult<()> {
        let activity = activity.clone();
        self.run(move |conn| queries::create_activity(conn, &activity))
            .await
    }

    async fn list_activities_by_license(
        &self,
        license_id: &str,
    ) -> StoreResult<Vec<LicenseActivity>> {
        let license_id = license_id.to_string();
        self.run(move |conn| queries::list_activities_by_license(conn, &license_id))
            .await
    }

    async fn list_licenses(&self, filters: &LicenseFilters) -> StoreResult<Vec<License>> {
        let filters = filters.clone();
        self.run(move |conn| queries::list_licenses(conn, &filters))
            .await
    }

    async fn has_active_licenses_for_client(&self, client_id: &str) -> StoreResult<bool> {
        let client_id = client_id.to_string();
        self.run(move |conn| queries::has_active_licenses_for_client(conn, &client_id))
            .await
    }
}
