use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::JsonMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    pub application_id: String,
    pub license_type_id: String,
    pub client_id: String,
    /// Opaque, globally unique. Never changes after creation.
    pub license_key: String,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    /// Metric name -> numeric ceiling. Owned copy, never shared with the type.
    pub usage_limits: JsonMap,
    /// Metric name -> last reported value. Only the usage meter writes this.
    pub current_usage: JsonMap,
    pub is_active: bool,
    pub is_revoked: bool,
    pub revocation_reason: Option<String>,
    pub last_check: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl License {
    /// The instant the license stops being valid: 00:00:00 UTC on the expiry date.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expiry_date.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLicense {
    pub license_type_id: String,
    pub client_id: String,
    /// Overrides the type's feature map when present
    #[serde(default)]
    pub usage_limits: Option<JsonMap>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLicense {
    pub license_type_id: Option<String>,
    pub usage_limits: Option<JsonMap>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LicenseFilters {
    #[serde(skip)]
    pub application_id: String,
    pub client_id: Option<String>,
    pub is_active: Option<bool>,
    pub is_revoked: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeLicense {
    pub reason: String,
}

/// Outcome of a validation, returned to callers verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub features: JsonMap,
}

impl ValidationResult {
    pub fn rejected(message: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            expires_at,
            features: JsonMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub license_key: String,
}

#[derive(Debug, Deserialize)]
pub struct UsageRequest {
    pub license_key: String,
    pub usage: JsonMap,
}
