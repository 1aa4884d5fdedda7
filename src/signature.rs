//! HMAC-SHA256 verification of inbound webhook signatures.
//!
//! The digest is computed over the exact raw request bytes — parsing and
//! re-serializing the body can change it byte-for-byte and invalidate the
//! signature. Callers log rejections with the remote address; this module
//! never logs the secret or a computed digest.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Verify a caller-supplied signature header against the raw request body.
///
/// The header is accepted as a bare hex digest or prefixed `sha256=<hex>`
/// (Nansen sends the bare form, GitHub-style senders the prefixed form).
///
/// Fails closed: no secret configured means no request is ever accepted.
pub fn verify(secret: Option<&str>, body: &[u8], header: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(provided) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return false;
    };
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);

    let expected = hex_digest(secret, body);
    constant_time_eq(expected.as_bytes(), provided.as_bytes())
}

/// Hex-encoded HMAC-SHA256 of `body` keyed with `secret`.
pub fn hex_digest(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
