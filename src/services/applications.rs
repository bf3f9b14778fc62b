use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{not_found, required};
use crate::context::RequestContext;
use crate::crypto::{API_KEY_BYTES, API_SECRET_BYTES, generate_secure_key, hash_secret, verify_secret};
use crate::error::{AppError, Result};
use crate::id::EntityType;
use crate::jwt::{AppClaims, TokenIssuer};
use crate::models::*;
use crate::repository::{Store, StoreError};

pub struct ApplicationService {
    store: Arc<dyn Store>,
    tokens: TokenIssuer,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    /// Create an application with fresh credentials. The secret is only ever returned here.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateApplication,
    ) -> Result<CreatedApplication> {
        let name = required(&input.name, "name")?;
        let api_secret = generate_secure_key(API_SECRET_BYTES);
        let now = Utc::now().timestamp();

        let application = Application {
            id: EntityType::Application.gen_id(),
            name,
            description: input.description.trim().to_string(),
            version: input.version.trim().to_string(),
            api_key: generate_secure_key(API_KEY_BYTES),
            api_secret_hash: hash_secret(&api_secret),
            created_at: now,
            updated_at: now,
        };
        ctx.write(self.store.create_application(&application)).await?;

        info!(application_id = %application.id, name = %application.name, "Application created");
        Ok(CreatedApplication {
            application,
            api_secret,
        })
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Application> {
        ctx.read(self.store.get_application_by_id(id))
            .await
            .map_err(not_found("Application"))
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Application>> {
        Ok(ctx.read(self.store.list_applications()).await?)
    }

    pub async fn count(&self, ctx: &RequestContext) -> Result<i64> {
        Ok(ctx.read(self.store.count_applications()).await?)
    }

    /// Update descriptive fields. Credentials are never changed here.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: UpdateApplication,
    ) -> Result<Application> {
        let mut application = self.get(ctx, id).await?;

        if let Some(name) = input.name {
            application.name = required(&name, "name")?;
        }
        if let Some(description) = input.description {
            application.description = description.trim().to_string();
        }
        if let Some(version) = input.version {
            application.version = version.trim().to_string();
        }

        ctx.write(self.store.update_application(&application))
            .await
            .map_err(not_found("Application"))?;
        application.updated_at = Utc::now().timestamp();
        Ok(application)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        ctx.write(self.store.delete_application(id))
            .await
            .map_err(not_found("Application"))?;
        info!(application_id = id, "Application deleted");
        Ok(())
    }

    /// Look up an application by API key and check the secret in constant time.
    pub async fn validate_credentials(
        &self,
        ctx: &RequestContext,
        api_key: &str,
        api_secret: &str,
    ) -> Result<Application> {
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(AppError::Unauthorized);
        }
        let application = match ctx.read(self.store.get_application_by_api_key(api_key)).await {
            Ok(app) => app,
            Err(StoreError::NotFound) => return Err(AppError::Unauthorized),
            Err(e) => return Err(e.into()),
        };
        if !verify_secret(api_secret, &application.api_secret_hash) {
            return Err(AppError::Unauthorized);
        }
        Ok(application)
    }

    /// Exchange API credentials for a bearer token.
    pub async fn generate_token(
        &self,
        ctx: &RequestContext,
        request: &TokenRequest,
    ) -> Result<TokenResponse> {
        let application = self
            .validate_credentials(ctx, &request.api_key, &request.api_secret)
            .await?;

        let access_token = self.tokens.issue(&AppClaims {
            application_id: application.id.clone(),
            api_key: application.api_key.clone(),
        })?;

        info!(application_id = %application.id, "Access token issued");
        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".into(),
            expires_in: self.tokens.lifetime_secs(),
        })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }
}
