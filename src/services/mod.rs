//! Administrative services for the entities around licenses.
//!
//! Every call that takes an `application_id` is scoped to that tenant:
//! records belonging to another application read as not found.

mod applications;
mod clients;
mod license_types;

pub use applications::ApplicationService;
pub use clients::ClientService;
pub use license_types::LicenseTypeService;

use crate::error::{AppError, Result};
use crate::repository::StoreError;

fn not_found(what: &'static str) -> impl Fn(StoreError) -> AppError {
    move |e| match e {
        StoreError::NotFound => AppError::NotFound(format!("{} not found", what)),
        other => other.into(),
    }
}

/// Reject records that belong to a different application.
fn ensure_owned(owner: &str, application_id: &str, what: &'static str) -> Result<()> {
    if owner != application_id {
        return Err(AppError::NotFound(format!("{} not found", what)));
    }
    Ok(())
}

/// Trimmed, non-empty value or `InvalidInput`.
fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}
