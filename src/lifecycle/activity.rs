use std::sync::Arc;

use chrono::Utc;

use crate::context::RequestContext;
use crate::id::EntityType;
use crate::models::{ActivityType, JsonMap, LicenseActivity};
use crate::repository::{LicenseRepository, StoreResult};

/// Build an activity row stamped with the caller's IP and user agent.
pub fn new_activity(
    ctx: &RequestContext,
    license_id: &str,
    activity_type: ActivityType,
    description: impl Into<String>,
    metadata: JsonMap,
) -> LicenseActivity {
    LicenseActivity {
        id: EntityType::Activity.gen_id(),
        license_id: license_id.to_string(),
        activity_type,
        description: description.into(),
        metadata,
        ip_address: ctx.ip_address.clone(),
        user_agent: ctx.user_agent.clone(),
        created_at: Utc::now().timestamp(),
    }
}

/// Appends audit records for licenses.
pub struct ActivityRecorder<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: LicenseRepository + ?Sized> ActivityRecorder<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn record(
        &self,
        ctx: &RequestContext,
        license_id: &str,
        activity_type: ActivityType,
        description: impl Into<String>,
        metadata: JsonMap,
    ) -> StoreResult<LicenseActivity> {
        let activity = new_activity(ctx, license_id, activity_type, description, metadata);
        ctx.write(self.repo.create_activity(&activity)).await?;
        Ok(activity)
    }

    /// Record, logging and swallowing any failure.
    pub async fn record_best_effort(
        &self,
        ctx: &RequestContext,
        license_id: &str,
        activity_type: ActivityType,
        description: impl Into<String>,
        metadata: JsonMap,
    ) {
        let kind = activity_type.clone();
        if let Err(e) = self
            .record(ctx, license_id, activity_type, description, metadata)
            .await
        {
            tracing::warn!(license_id, activity = %kind, "Failed to record activity: {}", e);
        }
    }
}
