//! License lifecycle: issuance, updates, revocation, validation and metering.
//!
//! Validity is derived on every read from the stored flags and dates; nothing
//! like "expired" is ever persisted.

mod activity;
pub mod keygen;
mod locks;
pub mod usage;
pub mod validity;

pub use activity::{ActivityRecorder, new_activity};
pub use locks::KeyLocks;
pub use validity::{LicenseStatus, evaluate};

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::context::RequestContext;
use crate::error::{AppError, Result};
use crate::id::EntityType;
use crate::models::*;
use crate::repository::{Store, StoreError};

/// Map a store `NotFound` onto a domain `NotFound` naming the entity.
fn not_found(what: &'static str) -> impl Fn(StoreError) -> AppError {
    move |e| match e {
        StoreError::NotFound => AppError::NotFound(format!("{} not found", what)),
        other => other.into(),
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

pub struct LicenseEngine {
    store: Arc<dyn Store>,
    recorder: ActivityRecorder<dyn Store>,
    usage_locks: KeyLocks,
}

impl LicenseEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            recorder: ActivityRecorder::new(store.clone()),
            store,
            usage_locks: KeyLocks::new(),
        }
    }

    /// Issue a new license for a client of `application_id`.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        application_id: &str,
        input: CreateLicense,
    ) -> Result<License> {
        require(application_id, "application_id")?;
        require(&input.license_type_id, "license_type_id")?;
        require(&input.client_id, "client_id")?;

        let license_type = ctx
            .read(self.store.get_license_type_by_id(&input.license_type_id))
            .await
            .map_err(not_found("License type"))?;
        if license_type.application_id != application_id {
            return Err(AppError::InvalidInput(
                "License type does not belong to this application".into(),
            ));
        }
        if license_type.duration_days < 1 {
            return Err(AppError::InvalidInput(format!(
                "License type has invalid duration: {} days",
                license_type.duration_days
            )));
        }

        let client = ctx
            .read(self.store.get_client_by_id(&input.client_id))
            .await
            .map_err(not_found("Client"))?;
        if client.application_id != application_id {
            return Err(AppError::NotFound("Client not found".into()));
        }

        let now = Utc::now();
        let start_date = now.date_naive();
        let mut license = License {
            id: EntityType::License.gen_id(),
            application_id: application_id.to_string(),
            license_type_id: license_type.id.clone(),
            client_id: client.id.clone(),
            license_key: keygen::generate(application_id, &client.id, &license_type.id),
            start_date,
            expiry_date: start_date + Duration::days(i64::from(license_type.duration_days)),
            usage_limits: input
                .usage_limits
                .unwrap_or_else(|| license_type.features.clone()),
            current_usage: JsonMap::new(),
            is_active: true,
            is_revoked: false,
            revocation_reason: None,
            last_check: None,
            created_at: now.timestamp(),
            updated_at: now.timestamp(),
        };

        match ctx.write(self.store.create_license(&license)).await {
            Err(StoreError::KeyCollision) => {
                warn!(application_id, "License key collision, retrying with a new key");
                license.license_key =
                    keygen::generate(application_id, &client.id, &license_type.id);
                ctx.write(self.store.create_license(&license))
                    .await
                    .map_err(|e| match e {
                        StoreError::KeyCollision => {
                            AppError::Storage("Could not allocate a unique license key".into())
                        }
                        other => other.into(),
                    })?;
            }
            other => other?,
        }

        info!(
            license_id = %license.id,
            application_id,
            client_id = %license.client_id,
            expiry_date = %license.expiry_date,
            "License created"
        );

        self.recorder
            .record_best_effort(
                ctx,
                &license.id,
                ActivityType::Creation,
                format!("License created with type {}", license_type.name),
                json_map(json!({
                    "license_type_id": license.license_type_id,
                    "expiry_date": license.expiry_date.to_string(),
                })),
            )
            .await;

        Ok(license)
    }

    /// Apply administrative changes. Key, dates and revocation state are preserved.
    ///
    /// Holds the license's usage lock so a limits change and a usage report
    /// cannot interleave; usage for metrics that lose their limit is dropped.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        changes: UpdateLicense,
    ) -> Result<License> {
        let license_key = ctx
            .read(self.store.get_license_by_id(id))
            .await
            .map_err(not_found("License"))?
            .license_key;
        let _guard = ctx.wait(self.usage_locks.acquire(&license_key)).await?;

        let mut license = ctx
            .read(self.store.get_license_by_id(id))
            .await
            .map_err(not_found("License"))?;

        let mut changed = JsonMap::new();

        if let Some(type_id) = changes.license_type_id {
            let license_type = ctx
                .read(self.store.get_license_type_by_id(&type_id))
                .await
                .map_err(not_found("License type"))?;
            if license_type.application_id != license.application_id {
                return Err(AppError::InvalidInput(
                    "License type does not belong to this application".into(),
                ));
            }
            changed.insert("license_type_id".into(), json!(type_id));
            license.license_type_id = type_id;
        }

        if let Some(limits) = changes.usage_limits {
            changed.insert("usage_limits".into(), json!(limits));
            license
                .current_usage
                .retain(|metric, _| limits.contains_key(metric));
            license.usage_limits = limits;
        }

        if let Some(is_active) = changes.is_active {
            if is_active && license.is_revoked {
                return Err(AppError::Conflict(
                    "A revoked license cannot be re-activated".into(),
                ));
            }
            changed.insert("is_active".into(), json!(is_active));
            license.is_active = is_active;
        }

        if changed.is_empty() {
            return Ok(license);
        }

        ctx.write(self.store.update_license(&license))
            .await
            .map_err(not_found("License"))?;
        license.updated_at = Utc::now().timestamp();

        info!(license_id = %license.id, "License updated");
        self.recorder
            .record_best_effort(ctx, &license.id, ActivityType::Update, "License updated", changed)
            .await;

        Ok(license)
    }

    /// Revoke a license. The flag change and its audit record are written together.
    pub async fn revoke(&self, ctx: &RequestContext, id: &str, reason: &str) -> Result<()> {
        let license = ctx
            .read(self.store.get_license_by_id(id))
            .await
            .map_err(not_found("License"))?;

        let reason = reason.trim();
        require(reason, "reason")?;

        if license.is_revoked {
            info!(
                license_id = %license.id,
                previous_reason = ?license.revocation_reason,
                "License already revoked, overwriting reason"
            );
        }

        let activity = new_activity(
            ctx,
            &license.id,
            ActivityType::Revocation,
            format!("License revoked: {}", reason),
            json_map(json!({ "reason": reason })),
        );

        ctx.write(self.store.revoke_license(&license.id, reason, &activity))
            .await
            .map_err(not_found("License"))?;

        info!(license_id = %license.id, reason, "License revoked");
        Ok(())
    }

    /// Check a license key and report its current validity and features.
    pub async fn validate(&self, ctx: &RequestContext, license_key: &str) -> Result<ValidationResult> {
        self.validate_inner(ctx, license_key)
            .await
            .map(|(_, result)| result)
    }

    async fn validate_inner(
        &self,
        ctx: &RequestContext,
        license_key: &str,
    ) -> Result<(License, ValidationResult)> {
        let invalid = || {
            AppError::LicenseInvalid(ValidationResult::rejected(validity::MSG_NOT_FOUND, None))
        };

        if license_key.trim().is_empty() {
            return Err(invalid());
        }

        let license = match ctx.read(self.store.get_license_by_key(license_key)).await {
            Ok(license) => license,
            Err(StoreError::NotFound) => {
                debug!("Validation for unknown license key");
                return Err(invalid());
            }
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();
        let status = evaluate(&license, now);
        if let Some(err) = validity::rejection(&license, status) {
            debug!(license_id = %license.id, ?status, "License rejected");
            return Err(err);
        }

        let features = ctx
            .read(self.store.get_license_type_by_id(&license.license_type_id))
            .await
            .map_err(not_found("License type"))?
            .features;

        if let Err(e) = ctx
            .write(self.store.record_check(&license.id, now.timestamp()))
            .await
        {
            warn!(license_id = %license.id, "Failed to record last check: {}", e);
        }

        self.recorder
            .record_best_effort(
                ctx,
                &license.id,
                ActivityType::Validation,
                validity::MSG_VALID,
                JsonMap::new(),
            )
            .await;

        let result = ValidationResult {
            valid: true,
            message: validity::MSG_VALID.to_string(),
            expires_at: Some(license.expires_at()),
            features,
        };
        Ok((license, result))
    }

    /// Validate the key, then meter the submitted usage against its limits.
    ///
    /// Calls for the same key are serialized so concurrent reports cannot
    /// interleave their read-check-write sequences. Waiting for the lock gives
    /// up when the request is cancelled or times out.
    pub async fn check_usage(
        &self,
        ctx: &RequestContext,
        license_key: &str,
        submitted: &JsonMap,
    ) -> Result<()> {
        let _guard = ctx.wait(self.usage_locks.acquire(license_key)).await?;

        let (license, _) = self.validate_inner(ctx, license_key).await?;
        let current_usage = usage::check_and_record(&license, submitted, Utc::now())?;

        ctx.write(self.store.update_usage(&license.id, &current_usage))
            .await
            .map_err(not_found("License"))?;

        debug!(license_id = %license.id, "Usage recorded");
        self.recorder
            .record_best_effort(
                ctx,
                &license.id,
                ActivityType::Usage,
                "Usage updated",
                submitted.clone(),
            )
            .await;

        Ok(())
    }

    pub async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> Result<License> {
        ctx.read(self.store.get_license_by_id(id))
            .await
            .map_err(not_found("License"))
    }

    pub async fn get_by_key(&self, ctx: &RequestContext, license_key: &str) -> Result<License> {
        ctx.read(self.store.get_license_by_key(license_key))
            .await
            .map_err(not_found("License"))
    }

    pub async fn list(&self, ctx: &RequestContext, filters: &LicenseFilters) -> Result<Vec<License>> {
        require(&filters.application_id, "application_id")?;
        Ok(ctx.read(self.store.list_licenses(filters)).await?)
    }

    /// Audit trail of a license, newest first.
    pub async fn activities(&self, ctx: &RequestContext, id: &str) -> Result<Vec<LicenseActivity>> {
        self.get_by_id(ctx, id).await?;
        Ok(ctx.read(self.store.list_activities_by_license(id)).await?)
    }
}

/// Unwrap a `json!({...})` literal into a map.
fn json_map(value: serde_json::Value) -> JsonMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}
