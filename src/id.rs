//! Prefixed ID generation for license manager entities.
//!
//! Format: `lm_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &["lm_app_", "lm_lt_", "lm_cli_", "lm_lic_", "lm_act_"];

/// Validate that a string is a well-formed prefixed ID.
///
/// This is a cheap check to reject garbage before hitting the database.
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that carry prefixed IDs.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Application,
    LicenseType,
    Client,
    License,
    Activity,
}

impl EntityType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Application => "lm_app",
            Self::LicenseType => "lm_lt",
            Self::Client => "lm_cli",
            Self::License => "lm_lic",
            Self::Activity => "lm_act",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = EntityType::License.gen_id();
        assert!(id.starts_with("lm_lic_"));
        // lm_lic_ (7 chars) + 32 hex chars
        assert_eq!(id.len(), 39);
    }

    #[test]
    fn test_all_prefixes_unique() {
        let prefixes = [
            EntityType::Application.prefix(),
            EntityType::LicenseType.prefix(),
            EntityType::Client.prefix(),
            EntityType::License.prefix(),
            EntityType::Activity.prefix(),
        ];

        let mut seen = std::collections::HashSet::new();
        for prefix in prefixes {
            assert!(seen.insert(prefix), "Duplicate prefix found: {}", prefix);
        }
    }

    #[test]
    fn test_is_valid_prefixed_id() {
        assert!(is_valid_prefixed_id("lm_app_a1b2c3d4e5f6789012345678901234ab"));
        assert!(is_valid_prefixed_id("lm_lic_00000000000000000000000000000000"));
        assert!(is_valid_prefixed_id(&EntityType::Client.gen_id()));
        assert!(is_valid_prefixed_id(&EntityType::Activity.gen_id()));

        assert!(!is_valid_prefixed_id(""));
        assert!(!is_valid_prefixed_id("a1b2c3d4-e5f6-7890-1234-567890123456"));
        assert!(!is_valid_prefixed_id("lm_zzz_a1b2c3d4e5f6789012345678901234ab"));
        assert!(!is_valid_prefixed_id("lm_app_a1b2c3d4"));
        assert!(!is_valid_prefixed_id("lm_app_a1b2c3d4e5f6789012345678901234gg"));
    }
}
