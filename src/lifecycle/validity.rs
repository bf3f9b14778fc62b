use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{License, ValidationResult};

pub const MSG_REVOKED: &str = "License has been revoked";
pub const MSG_EXPIRED: &str = "License has expired";
pub const MSG_INACTIVE: &str = "License is not active";
pub const MSG_NOT_FOUND: &str = "License not found";
pub const MSG_VALID: &str = "License validated successfully";

/// Derived state of a license at a point in time. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseStatus {
    Active,
    Expired,
    Revoked,
    Inactive,
}

/// Classify a license. First match wins: revoked, expired, inactive, active.
pub fn evaluate(license: &License, now: DateTime<Utc>) -> LicenseStatus {
    let expired = now > license.expires_at();

    if license.is_revoked {
        return LicenseStatus::Revoked;
    }
    if expired {
        if !license.is_active {
            tracing::debug!(license_id = %license.id, "License is both expired and inactive");
        }
        return LicenseStatus::Expired;
    }
    if !license.is_active {
        return LicenseStatus::Inactive;
    }
    LicenseStatus::Active
}

/// The caller-facing error for a non-active status, or `None` when active.
pub fn rejection(license: &License, status: LicenseStatus) -> Option<AppError> {
    let expires_at = Some(license.expires_at());
    match status {
        LicenseStatus::Active => None,
        LicenseStatus::Revoked => Some(AppError::LicenseRevoked(ValidationResult::rejected(
            MSG_REVOKED,
            expires_at,
        ))),
        LicenseStatus::Expired => Some(AppError::LicenseExpired(ValidationResult::rejected(
            MSG_EXPIRED,
            expires_at,
        ))),
        LicenseStatus::Inactive => Some(AppError::LicenseInvalid(ValidationResult::rejected(
            MSG_INACTIVE,
            expires_at,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JsonMap;
    use chrono::{NaiveDate, TimeZone};

    fn license(is_active: bool, is_revoked: bool) -> License {
        License {
            id: "lm_lic_test".into(),
            application_id: "app".into(),
            license_type_id: "type".into(),
            client_id: "client".into(),
            license_key: "key".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            usage_limits: JsonMap::new(),
            current_usage: JsonMap::new(),
            is_active,
            is_revoked,
            revocation_reason: None,
            last_check: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_active_within_window() {
        assert_eq!(evaluate(&license(true, false), at(2025, 1, 15, 12)), LicenseStatus::Active);
    }

    #[test]
    fn test_expiry_boundary_is_midnight() {
        let l = license(true, false);
        assert_eq!(evaluate(&l, at(2025, 1, 31, 0)), LicenseStatus::Active);
        assert_eq!(evaluate(&l, at(2025, 1, 31, 1)), LicenseStatus::Expired);
    }

    #[test]
    fn test_revoked_wins_over_expired() {
        let l = license(false, true);
        assert_eq!(evaluate(&l, at(2026, 1, 1, 0)), LicenseStatus::Revoked);
    }

    #[test]
    fn test_expired_wins_over_inactive() {
        let l = license(false, false);
        assert_eq!(evaluate(&l, at(2026, 1, 1, 0)), LicenseStatus::Expired);
        assert_eq!(evaluate(&l, at(2025, 1, 10, 0)), LicenseStatus::Inactive);
    }

    #[test]
    fn test_rejection_messages() {
        let l = license(true, false);
        assert!(rejection(&l, LicenseStatus::Active).is_none());

        let err = rejection(&l, LicenseStatus::Revoked).unwrap();
        let result = err.validation_result().unwrap();
        assert!(!result.valid);
        assert_eq!(result.message, MSG_REVOKED);
        assert_eq!(result.expires_at, Some(l.expires_at()));

        assert!(matches!(
            rejection(&l, LicenseStatus::Inactive),
            Some(AppError::LicenseInvalid(r)) if r.message == MSG_INACTIVE
        ));
    }
}
