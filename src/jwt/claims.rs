use serde::{Deserialize, Serialize};

/// Custom claims carried by application access tokens.
/// Standard claims (iss, sub, iat, exp) are handled by jwt-simple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppClaims {
    pub application_id: String,
    pub api_key: String,
}
