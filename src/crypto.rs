//! Credential generation and hashing.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Bytes of entropy in an application API key (hex-encoded to 64 chars).
pub const API_KEY_BYTES: usize = 32;

/// Bytes of entropy in an application API secret (hex-encoded to 128 chars).
pub const API_SECRET_BYTES: usize = 64;

/// Generate `len` random bytes from the OS RNG, hex-encoded.
pub fn generate_secure_key(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a secret for storage. SHA-256 with a fixed salt, lowercase hex.
pub fn hash_secret(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"license-manager-v1:");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a presented secret against a stored hash without leaking timing.
pub fn verify_secret(presented: &str, stored_hash: &str) -> bool {
    let computed = hash_secret(presented);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
