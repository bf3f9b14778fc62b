use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{ensure_owned, not_found, required};
use crate::context::RequestContext;
use crate::error::{AppError, Result};
use crate::id::EntityType;
use crate::models::*;
use crate::repository::Store;

/// Trim and lowercase; require something that at least looks like an address.
fn normalize_email(email: &str) -> Result<String> {
    let email = required(email, "email")?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::InvalidInput(format!("Invalid email address: {}", email))),
    }
}

/// Blank optional strings are stored as absent.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub struct ClientService {
    store: Arc<dyn Store>,
}

impl ClientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn ensure_email_free(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        let taken = ctx
            .read(self.store.client_email_exists(application_id, email, exclude_id))
            .await?;
        if taken {
            return Err(AppError::Conflict(format!(
                "A client with email {} already exists",
                email
            )));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        input: CreateClient,
    ) -> Result<Client> {
        let name = required(&input.name, "name")?;
        let email = normalize_email(&input.email)?;
        self.ensure_email_free(ctx, application_id, &email, None)
            .await?;

        let now = Utc::now().timestamp();
        let client = Client {
            id: EntityType::Client.gen_id(),
            application_id: application_id.to_string(),
            name,
            email,
            company: optional(input.company),
            contact_person: optional(input.contact_person),
            phone: optional(input.phone),
            metadata: input.metadata.unwrap_or_default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        ctx.write(self.store.create_client(&client)).await?;

        info!(client_id = %client.id, application_id, "Client created");
        Ok(client)
    }

    pub async fn get(&self, ctx: &RequestContext, application_id: &str, id: &str) -> Result<Client> {
        let client = ctx
            .read(self.store.get_client_by_id(id))
            .await
            .map_err(not_found("Client"))?;
        ensure_owned(&client.application_id, application_id, "Client")?;
        Ok(client)
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        filters: &ClientFilters,
    ) -> Result<Vec<Client>> {
        Ok(ctx
            .read(self.store.list_clients(application_id, filters))
            .await?)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        id: &str,
        input: UpdateClient,
    ) -> Result<Client> {
        let mut client = self.get(ctx, application_id, id).await?;

        if let Some(name) = input.name {
            client.name = required(&name, "name")?;
        }
        if let Some(email) = input.email {
            let email = normalize_email(&email)?;
            if email != client.email {
                self.ensure_email_free(ctx, application_id, &email, Some(id))
                    .await?;
                client.email = email;
            }
        }
        if input.company.is_some() {
            client.company = optional(input.company);
        }
        if input.contact_person.is_some() {
            client.contact_person = optional(input.contact_person);
        }
        if input.phone.is_some() {
            client.phone = optional(input.phone);
        }
        if let Some(metadata) = input.metadata {
            client.metadata = metadata;
        }
        if let Some(is_active) = input.is_active {
            client.is_active = is_active;
        }

        ctx.write(self.store.update_client(&client))
            .await
            .map_err(not_found("Client"))?;
        client.updated_at = Utc::now().timestamp();
        Ok(client)
    }

    /// Soft delete: the client is marked inactive. Refused while it holds an active license.
    pub async fn delete(&self, ctx: &RequestContext, application_id: &str, id: &str) -> Result<()> {
        let mut client = self.get(ctx, application_id, id).await?;

        if ctx
            .read(self.store.has_active_licenses_for_client(id))
            .await?
        {
            return Err(AppError::Conflict(
                "Client has active licenses; revoke or deactivate them first".into(),
            ));
        }

        client.is_active = false;
        ctx.write(self.store.update_client(&client))
            .await
            .map_err(not_found("Client"))?;
        info!(client_id = id, "Client deactivated");
        Ok(())
    }

    pub async fn licenses(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        id: &str,
    ) -> Result<Vec<License>> {
        self.get(ctx, application_id, id).await?;
        let filters = LicenseFilters {
            application_id: application_id.to_string(),
            client_id: Some(id.to_string()),
            ..Default::default()
        };
        Ok(ctx.read(self.store.list_licenses(&filters)).await?)
    }
}
