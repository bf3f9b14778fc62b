use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{ensure_owned, not_found, required};
use crate::context::RequestContext;
use crate::error::{AppError, Result};
use crate::id::EntityType;
use crate::models::*;
use crate::repository::Store;

fn check_duration(days: i32) -> Result<()> {
    if days < 1 {
        return Err(AppError::InvalidInput(
            "duration_days must be at least 1".into(),
        ));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::InvalidInput("price must be non-negative".into()));
    }
    Ok(())
}

pub struct LicenseTypeService {
    store: Arc<dyn Store>,
}

impl LicenseTypeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        input: CreateLicenseType,
    ) -> Result<LicenseType> {
        let name = required(&input.name, "name")?;
        check_duration(input.duration_days)?;
        check_price(input.price)?;

        let now = Utc::now().timestamp();
        let license_type = LicenseType {
            id: EntityType::LicenseType.gen_id(),
            application_id: application_id.to_string(),
            name,
            description: input.description.trim().to_string(),
            duration_days: input.duration_days,
            price: input.price,
            is_active: input.is_active,
            features: input.features,
            created_at: now,
            updated_at: now,
        };
        ctx.write(self.store.create_license_type(&license_type))
            .await?;

        info!(license_type_id = %license_type.id, application_id, "License type created");
        Ok(license_type)
    }

    pub async fn get(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        id: &str,
    ) -> Result<LicenseType> {
        let license_type = ctx
            .read(self.store.get_license_type_by_id(id))
            .await
            .map_err(not_found("License type"))?;
        ensure_owned(&license_type.application_id, application_id, "License type")?;
        Ok(license_type)
    }

    pub async fn list(&self, ctx: &RequestContext, application_id: &str) -> Result<Vec<LicenseType>> {
        Ok(ctx
            .read(self.store.list_license_types(application_id))
            .await?)
    }

    /// Existing licenses keep their own limits and dates; only new issuance sees the change.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        id: &str,
        input: UpdateLicenseType,
    ) -> Result<LicenseType> {
        let mut license_type = self.get(ctx, application_id, id).await?;

        if let Some(name) = input.name {
            license_type.name = required(&name, "name")?;
        }
        if let Some(description) = input.description {
            license_type.description = description.trim().to_string();
        }
        if let Some(days) = input.duration_days {
            check_duration(days)?;
            license_type.duration_days = days;
        }
        if let Some(price) = input.price {
            check_price(price)?;
            license_type.price = price;
        }
        if let Some(is_active) = input.is_active {
            license_type.is_active = is_active;
        }
        if let Some(features) = input.features {
            license_type.features = features;
        }

        ctx.write(self.store.update_license_type(&license_type))
            .await
            .map_err(not_found("License type"))?;
        license_type.updated_at = Utc::now().timestamp();
        Ok(license_type)
    }

    /// Refused while any license still references the type.
    pub async fn delete(&self, ctx: &RequestContext, application_id: &str, id: &str) -> Result<()> {
        self.get(ctx, application_id, id).await?;

        if ctx.read(self.store.license_type_in_use(id)).await? {
            return Err(AppError::Conflict(
                "License type is referenced by existing licenses".into(),
            ));
        }

        ctx.write(self.store.delete_license_type(id))
            .await
            .map_err(not_found("License type"))?;
        info!(license_type_id = id, "License type deleted");
        Ok(())
    }
}
