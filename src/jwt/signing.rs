use jwt_simple::prelude::*;

use super::AppClaims;
use crate::error::{AppError, Result};

/// Issuer claim stamped on (and required of) every token.
pub const TOKEN_ISSUER: &str = "license-manager";

/// Shortest HMAC secret accepted for HS256 signing.
pub const MIN_SECRET_LEN: usize = 32;

/// Signs and verifies HS256 application tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: HS256Key,
    lifetime_hours: u64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], lifetime_hours: u64) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Internal(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self {
            key: HS256Key::from_bytes(secret),
            lifetime_hours,
        })
    }

    pub fn lifetime_secs(&self) -> u64 {
        self.lifetime_hours * 3600
    }

    pub fn issue(&self, claims: &AppClaims) -> Result<String> {
        let jwt_claims =
            Claims::with_custom_claims(claims.clone(), Duration::from_hours(self.lifetime_hours))
                .with_issuer(TOKEN_ISSUER)
                .with_subject(&claims.application_id);

        self.key
            .authenticate(jwt_claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature, issuer and expiry. Any failure is `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<AppClaims> {
        let options = VerificationOptions {
            allowed_issuers: Some(HashSet::from_strings(&[TOKEN_ISSUER])),
            ..Default::default()
        };
        let claims = self
            .key
            .verify_token::<AppClaims>(token, Some(options))
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                AppError::Unauthorized
            })?;
        Ok(claims.custom)
    }
}
