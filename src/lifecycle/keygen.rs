use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Length of a license key in hex characters.
pub const LICENSE_KEY_LEN: usize = 32;

/// Disambiguates keys generated within the same clock tick.
static NONCE: AtomicU64 = AtomicU64::new(0);

/// Derive a fresh license key for an (application, client, type) triad.
///
/// SHA-256 over the triad, the current time in nanoseconds and a process-wide
/// counter, hex-encoded and truncated. Uniqueness is ultimately enforced by
/// storage; a collision there is retried with a new key.
pub fn generate(application_id: &str, client_id: &str, license_type_id: &str) -> String {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    let nonce = NONCE.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}-{}-{}-{}-{}",
        application_id, client_id, license_type_id, nanos, nonce
    ));
    let mut key = hex::encode(hasher.finalize());
    key.truncate(LICENSE_KEY_LEN);
    key
}
