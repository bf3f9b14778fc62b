use serde::{Deserialize, Serialize};

use super::JsonMap;

/// A plan/tier template: duration plus the default feature and quota map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseType {
    pub id: String,
    pub application_id: String,
    pub name: String,
    pub description: String,
    pub duration_days: i32,
    pub price: f64,
    pub is_active: bool,
    /// Arbitrary JSON features; numeric entries double as usage ceilings
    pub features: JsonMap,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateLicenseType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_days: i32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub features: JsonMap,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLicenseType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_days: Option<i32>,
    pub price: Option<f64>,
    pub is_active: Option<bool>,
    pub features: Option<JsonMap>,
}

fn default_true() -> bool {
    true
}
