use serde::{Deserialize, Serialize};

use super::JsonMap;

/// An end customer of an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub application_id: String,
    pub name: String,
    /// Unique within the application (trimmed, lowercased)
    pub email: String,
    pub company: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub metadata: JsonMap,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub metadata: Option<JsonMap>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    /// Omitted metadata keeps the stored map
    pub metadata: Option<JsonMap>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ClientFilters {
    pub is_active: Option<bool>,
    /// Case-insensitive substring match over name, email and company
    pub search: Option<String>,
}
