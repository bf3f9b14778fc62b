use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    /// Public half of the credential pair, used to look the application up
    pub api_key: String,
    /// Salted SHA-256 of the API secret; the plaintext is never stored
    #[serde(skip_serializing, default)]
    pub api_secret_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Returned once, at creation. The secret cannot be recovered afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedApplication {
    #[serde(flatten)]
    pub application: Application,
    pub api_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplication {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateApplication {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}
