//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! Models implement `FromRow` to define how they are constructed from a row;
//! `query_one` and `query_all` cover the common query shapes.

use rusqlite::{Connection, OptionalExtension, Row, ToSql, types::Type};

use crate::models::*;
use crate::repository::StoreResult;

/// Parse a JSON object stored as TEXT, surfacing bad data as a conversion error.
fn parse_json_map(row: &Row, col: usize) -> rusqlite::Result<JsonMap> {
    let raw: String = row.get(col)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e)))
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> StoreResult<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> StoreResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const APPLICATION_COLS: &str =
    "id, name, description, version, api_key, api_secret_hash, created_at, updated_at";

pub const LICENSE_TYPE_COLS: &str = "id, application_id, name, description, duration_days, price, is_active, features, created_at, updated_at";

pub const CLIENT_COLS: &str = "id, application_id, name, email, company, contact_person, phone, metadata, is_active, created_at, updated_at";

pub const LICENSE_COLS: &str = "id, application_id, license_type_id, client_id, license_key, start_date, expiry_date, usage_limits, current_usage, is_active, is_revoked, revocation_reason, last_check, created_at, updated_at";

pub const ACTIVITY_COLS: &str =
    "id, license_id, activity_type, description, metadata, ip_address, user_agent, created_at";

// ============ FromRow Implementations ============

impl FromRow for Application {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Application {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            version: row.get(3)?,
            api_key: row.get(4)?,
            api_secret_hash: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for LicenseType {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LicenseType {
            id: row.get(0)?,
            application_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            duration_days: row.get(4)?,
            price: row.get(5)?,
            is_active: row.get(6)?,
            features: parse_json_map(row, 7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl FromRow for Client {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Client {
            id: row.get(0)?,
            application_id: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            company: row.get(4)?,
            contact_person: row.get(5)?,
            phone: row.get(6)?,
            metadata: parse_json_map(row, 7)?,
            is_active: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl FromRow for License {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(License {
            id: row.get(0)?,
            application_id: row.get(1)?,
            license_type_id: row.get(2)?,
            client_id: row.get(3)?,
            license_key: row.get(4)?,
            start_date: row.get(5)?,
            expiry_date: row.get(6)?,
            usage_limits: parse_json_map(row, 7)?,
            current_usage: parse_json_map(row, 8)?,
            is_active: row.get(9)?,
            is_revoked: row.get(10)?,
            revocation_reason: row.get(11)?,
            last_check: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

impl FromRow for LicenseActivity {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // Unknown values fall back to ActivityType::Other
        let activity_type: String = row.get(2)?;
        Ok(LicenseActivity {
            id: row.get(0)?,
            license_id: row.get(1)?,
            activity_type: activity_type.into(),
            description: row.get(3)?,
            metadata: parse_json_map(row, 4)?,
            ip_address: row.get(5)?,
            user_agent: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}
