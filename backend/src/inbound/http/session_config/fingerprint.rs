//! Non-secret fingerprint of the session key.
//!
//! Operators compare fingerprints across replicas to confirm they share a key
//! without ever printing key material.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Bytes of the SHA-256 digest kept before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Hex-encode the first eight bytes of the SHA-256 digest of the signing key.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use emoji_backend::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let key = Key::derive_from(&[7_u8; 64]);
/// let fingerprint = key_fingerprint(&key);
/// assert_eq!(fingerprint.len(), 16);
/// assert_eq!(fingerprint, key_fingerprint(&key));
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(digest.get(..FINGERPRINT_BYTES).unwrap_or_default())
}
