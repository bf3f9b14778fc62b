use chrono::Utc;
use rusqlite::{Connection, ErrorCode, ToSql, params, types::Value};

use crate::models::*;
use crate::repository::{StoreError, StoreResult};

use super::from_row::{
    ACTIVITY_COLS, APPLICATION_COLS, CLIENT_COLS, LICENSE_COLS, LICENSE_TYPE_COLS, query_all,
    query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// True when `err` is a UNIQUE violation mentioning `column` (e.g. "licenses.license_key").
fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == ErrorCode::ConstraintViolation && msg.contains(column)
    )
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    /// Set a column to an explicit value (including NULL).
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    fn set_json(self, column: &'static str, value: &JsonMap) -> StoreResult<Self> {
        Ok(self.set(column, serde_json::to_string(value)?))
    }

    /// Returns false when no row matched.
    fn execute(mut self, conn: &Connection) -> StoreResult<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Applications ============

pub fn create_application(conn: &Connection, app: &Application) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO applications (id, name, description, version, api_key, api_secret_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &app.id,
            &app.name,
            &app.description,
            &app.version,
            &app.api_key,
            &app.api_secret_hash,
            app.created_at,
            app.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_application_by_id(conn: &Connection, id: &str) -> StoreResult<Option<Application>> {
    query_one(
        conn,
        &format!("SELECT {} FROM applications WHERE id = ?1", APPLICATION_COLS),
        &[&id],
    )
}

pub fn get_application_by_api_key(
    conn: &Connection,
    api_key: &str,
) -> StoreResult<Option<Application>> {
    query_one(
        conn,
        &format!("SELECT {} FROM applications WHERE api_key = ?1", APPLICATION_COLS),
        &[&api_key],
    )
}

pub fn list_applications(conn: &Connection) -> StoreResult<Vec<Application>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM applications ORDER BY created_at DESC, id",
            APPLICATION_COLS
        ),
        &[],
    )
}

/// Credentials are never touched here.
pub fn update_application(conn: &Connection, app: &Application) -> StoreResult<bool> {
    UpdateBuilder::new("applications", &app.id)
        .with_updated_at()
        .set("name", app.name.clone())
        .set("description", app.description.clone())
        .set("version", app.version.clone())
        .execute(conn)
}

/// Delete an application and everything it owns in one transaction.
pub fn delete_application(conn: &mut Connection, id: &str) -> StoreResult<bool> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM license_activities WHERE license_id IN (SELECT id FROM licenses WHERE application_id = ?1)",
        params![id],
    )?;
    tx.execute("DELETE FROM licenses WHERE application_id = ?1", params![id])?;
    tx.execute("DELETE FROM clients WHERE application_id = ?1", params![id])?;
    tx.execute("DELETE FROM license_types WHERE application_id = ?1", params![id])?;
    let deleted = tx.execute("DELETE FROM applications WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

pub fn count_applications(conn: &Connection) -> StoreResult<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM applications", [], |row| row.get(0))?;
    Ok(count)
}

// ============ License Types ============

pub fn create_license_type(conn: &Connection, lt: &LicenseType) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO license_types (id, application_id, name, description, duration_days, price, is_active, features, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &lt.id,
            &lt.application_id,
            &lt.name,
            &lt.description,
            lt.duration_days,
            lt.price,
            lt.is_active,
            serde_json::to_string(&lt.features)?,
            lt.created_at,
            lt.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_license_type_by_id(conn: &Connection, id: &str) -> StoreResult<Option<LicenseType>> {
    query_one(
        conn,
        &format!("SELECT {} FROM license_types WHERE id = ?1", LICENSE_TYPE_COLS),
        &[&id],
    )
}

pub fn list_license_types(conn: &Connection, application_id: &str) -> StoreResult<Vec<LicenseType>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM license_types WHERE application_id = ?1 ORDER BY created_at DESC, id",
            LICENSE_TYPE_COLS
        ),
        &[&application_id],
    )
}

pub fn update_license_type(conn: &Connection, lt: &LicenseType) -> StoreResult<bool> {
    UpdateBuilder::new("license_types", &lt.id)
        .with_updated_at()
        .set("name", lt.name.clone())
        .set("description", lt.description.clone())
        .set("duration_days", lt.duration_days)
        .set("price", lt.price)
        .set("is_active", lt.is_active)
        .set_json("features", &lt.features)?
        .execute(conn)
}

pub fn delete_license_type(conn: &Connection, id: &str) -> StoreResult<bool> {
    let deleted = conn.execute("DELETE FROM license_types WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn license_type_in_use(conn: &Connection, id: &str) -> StoreResult<bool> {
    let in_use = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM licenses WHERE license_type_id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(in_use)
}

// ============ Clients ============

pub fn create_client(conn: &Connection, client: &Client) -> StoreResult<()> {
    let result = conn.execute(
        "INSERT INTO clients (id, application_id, name, email, company, contact_person, phone, metadata, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &client.id,
            &client.application_id,
            &client.name,
            &client.email,
            &client.company,
            &client.contact_person,
            &client.phone,
            serde_json::to_string(&client.metadata)?,
            client.is_active,
            client.created_at,
            client.updated_at
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e, "clients.") => Err(StoreError::Conflict(format!(
            "A client with email {} already exists",
            client.email
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn get_client_by_id(conn: &Connection, id: &str) -> StoreResult<Option<Client>> {
    query_one(
        conn,
        &format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLS),
        &[&id],
    )
}

pub fn list_clients(
    conn: &Connection,
    application_id: &str,
    filters: &ClientFilters,
) -> StoreResult<Vec<Client>> {
    let mut sql = format!("SELECT {} FROM clients WHERE application_id = ?", CLIENT_COLS);
    let mut values: Vec<Value> = vec![application_id.to_string().into()];

    if let Some(is_active) = filters.is_active {
        sql.push_str(" AND is_active = ?");
        values.push(is_active.into());
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        sql.push_str(
            " AND (LOWER(name) LIKE ? OR LOWER(email) LIKE ? OR LOWER(COALESCE(company, '')) LIKE ?)",
        );
        let pattern = format!("%{}%", search.to_lowercase());
        for _ in 0..3 {
            values.push(pattern.clone().into());
        }
    }
    sql.push_str(" ORDER BY created_at DESC, id");

    let refs: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
    query_all(conn, &sql, &refs)
}

pub fn update_client(conn: &Connection, client: &Client) -> StoreResult<bool> {
    let result = UpdateBuilder::new("clients", &client.id)
        .with_updated_at()
        .set("name", client.name.clone())
        .set("email", client.email.clone())
        .set_nullable("company", client.company.clone())
        .set_nullable("contact_person", client.contact_person.clone())
        .set_nullable("phone", client.phone.clone())
        .set("is_active", client.is_active)
        .set_json("metadata", &client.metadata)?
        .execute(conn);
    match result {
        Err(StoreError::Database(e)) if is_unique_violation(&e, "clients.") => Err(
            StoreError::Conflict(format!("A client with email {} already exists", client.email)),
        ),
        other => other,
    }
}

pub fn client_email_exists(
    conn: &Connection,
    application_id: &str,
    email: &str,
    exclude_id: Option<&str>,
) -> StoreResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM clients WHERE application_id = ?1 AND email = ?2 AND (?3 IS NULL OR id != ?3))",
        params![application_id, email, exclude_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// ============ Licenses ============

/// Insert a license. A duplicate key surfaces as `StoreError::KeyCollision`.
pub fn create_license(conn: &Connection, license: &License) -> StoreResult<()> {
    let result = conn.execute(
        "INSERT INTO licenses (id, application_id, license_type_id, client_id, license_key, start_date, expiry_date, usage_limits, current_usage, is_active, is_revoked, revocation_reason, last_check, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            &license.id,
            &license.application_id,
            &license.license_type_id,
            &license.client_id,
            &license.license_key,
            license.start_date,
            license.expiry_date,
            serde_json::to_string(&license.usage_limits)?,
            serde_json::to_string(&license.current_usage)?,
            license.is_active,
            license.is_revoked,
            &license.revocation_reason,
            license.last_check,
            license.created_at,
            license.updated_at
        ],
    );
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e, "licenses.license_key") => Err(StoreError::KeyCollision),
        Err(e) => Err(e.into()),
    }
}

pub fn get_license_by_id(conn: &Connection, id: &str) -> StoreResult<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licenses WHERE id = ?1", LICENSE_COLS),
        &[&id],
    )
}

pub fn get_license_by_key(conn: &Connection, license_key: &str) -> StoreResult<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licenses WHERE license_key = ?1", LICENSE_COLS),
        &[&license_key],
    )
}

/// Write the administrative columns of a license: type, limits and the active flag.
///
/// Runs as one immediate transaction against the stored row. Usage for metrics
/// that no longer have a limit is dropped, and a revoked row refuses to be
/// marked active. Revocation columns, key, dates and last check are never touched.
pub fn update_license(conn: &mut Connection, license: &License) -> StoreResult<bool> {
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
    let Some(stored) = get_license_by_id(&tx, &license.id)? else {
        return Ok(false);
    };
    if stored.is_revoked && license.is_active {
        return Err(StoreError::Conflict("License has been revoked".into()));
    }

    let mut current_usage = stored.current_usage;
    current_usage.retain(|metric, _| license.usage_limits.contains_key(metric));

    let updated = UpdateBuilder::new("licenses", &license.id)
        .with_updated_at()
        .set("license_type_id", license.license_type_id.clone())
        .set_json("usage_limits", &license.usage_limits)?
        .set_json("current_usage", &current_usage)?
        .set("is_active", license.is_active)
        .execute(&tx)?;
    tx.commit()?;
    Ok(updated)
}

pub fn update_usage(conn: &Connection, id: &str, current_usage: &JsonMap) -> StoreResult<bool> {
    UpdateBuilder::new("licenses", id)
        .with_updated_at()
        .set_json("current_usage", current_usage)?
        .execute(conn)
}

pub fn record_check(conn: &Connection, id: &str, checked_at: i64) -> StoreResult<bool> {
    UpdateBuilder::new("licenses", id)
        .set("last_check", checked_at)
        .execute(conn)
}

/// Revoke a license and append its audit record atomically: both rows persist or neither does.
pub fn revoke_license(
    conn: &mut Connection,
    id: &str,
    reason: &str,
    activity: &LicenseActivity,
) -> StoreResult<bool> {
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
    let revoked = UpdateBuilder::new("licenses", id)
        .with_updated_at()
        .set("is_revoked", true)
        .set("is_active", false)
        .set("revocation_reason", reason.to_string())
        .execute(&tx)?;
    if !revoked {
        return Ok(false);
    }
    create_activity(&tx, activity)?;
    tx.commit()?;
    Ok(true)
}

pub fn list_licenses(conn: &Connection, filters: &LicenseFilters) -> StoreResult<Vec<License>> {
    let mut sql = format!("SELECT {} FROM licenses WHERE application_id = ?", LICENSE_COLS);
    let mut values: Vec<Value> = vec![filters.application_id.clone().into()];

    if let Some(ref client_id) = filters.client_id {
        sql.push_str(" AND client_id = ?");
        values.push(client_id.clone().into());
    }
    if let Some(is_active) = filters.is_active {
        sql.push_str(" AND is_active = ?");
        values.push(is_active.into());
    }
    if let Some(is_revoked) = filters.is_revoked {
        sql.push_str(" AND is_revoked = ?");
        values.push(is_revoked.into());
    }
    sql.push_str(" ORDER BY created_at DESC, id");

    let refs: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
    query_all(conn, &sql, &refs)
}

pub fn has_active_licenses_for_client(conn: &Connection, client_id: &str) -> StoreResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM licenses WHERE client_id = ?1 AND is_active = 1 AND is_revoked = 0)",
        params![client_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// ============ License Activities ============

pub fn create_activity(conn: &Connection, activity: &LicenseActivity) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO license_activities (id, license_id, activity_type, description, metadata, ip_address, user_agent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &activity.id,
            &activity.license_id,
            activity.activity_type.as_str(),
            &activity.description,
            serde_json::to_string(&activity.metadata)?,
            &activity.ip_address,
            &activity.user_agent,
            activity.created_at
        ],
    )?;
    Ok(())
}

pub fn list_activities_by_license(
    conn: &Connection,
    license_id: &str,
) -> StoreResult<Vec<LicenseActivity>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM license_activities WHERE license_id = ?1 ORDER BY created_at DESC, rowid DESC",
            ACTIVITY_COLS
        ),
        &[&license_id],
    )
}

