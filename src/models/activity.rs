use serde::{Deserialize, Serialize};
use strum::EnumString;

use super::JsonMap;

/// Kind of audit event recorded against a license.
///
/// Unknown values read back from storage land in `Other` so they round-trip.
#[derive(Debug, Clone, PartialEq, Eq, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    Validation,
    Revocation,
    Usage,
    Creation,
    Update,
    #[strum(default)]
    Other(String),
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Validation => "validation",
            Self::Revocation => "revocation",
            Self::Usage => "usage",
            Self::Creation => "creation",
            Self::Update => "update",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ActivityType {
    fn from(s: String) -> Self {
        // strum(default) makes parsing infallible
        s.parse().unwrap_or(Self::Other(s))
    }
}

impl From<ActivityType> for String {
    fn from(t: ActivityType) -> Self {
        t.as_str().to_string()
    }
}

/// Append-only audit record. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseActivity {
    pub id: String,
    pub license_id: String,
    pub activity_type: ActivityType,
    pub description: String,
    pub metadata: JsonMap,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: i64,
}
