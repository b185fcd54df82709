//! Cryptographic operations for webhook payloads and stored secrets.
//!
//! - HMAC-SHA256 verification of inbound payload signatures
//! - AES-256-GCM encryption of subscription secrets at rest

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::WebhookError;

/// Nonce size for AES-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// HMAC-SHA256 payload signatures
// ---------------------------------------------------------------------------

/// Compute the hex-encoded HMAC-SHA256 of the exact raw body.
#[must_use]
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a `"<prefix>=<hex-hmac>"` signature header against the raw body.
///
/// A malformed header (missing separator, wrong prefix) and a digest
/// mismatch both reject the delivery before anything is processed. The
/// digest comparison is constant-time.
pub fn verify_signature(
    header: &str,
    expected_prefix: &str,
    secret: &str,
    body: &[u8],
) -> Result<(), WebhookError> {
    let Some((prefix, provided_hex)) = header.split_once('=') else {
        return Err(WebhookError::Verification(
            "signature header is missing the '=' separator".to_string(),
        ));
    };
    if prefix != expected_prefix {
        return Err(WebhookError::Verification(format!(
            "unexpected signature prefix '{prefix}'"
        )));
    }

    let computed = compute_signature(secret, body);
    if computed.as_bytes().ct_eq(provided_hex.as_bytes()).into() {
        Ok(())
    } else {
        Err(WebhookError::Verification(
            "signature does not match payload".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// AES-256-GCM secrets at rest
// ---------------------------------------------------------------------------

/// Encrypt a subscription secret to a base64 string for storage.
///
/// Format: `base64(nonce || ciphertext || auth_tag)`.
pub fn encrypt_secret(plaintext: &str, key: &[u8]) -> Result<String, WebhookError> {
    let cipher = cipher_for(key)?;

    use rand::rngs::OsRng;
    use rand::RngCore;
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| WebhookError::Encryption(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(&out))
}

/// Decrypt a stored subscription secret back to plaintext.
pub fn decrypt_secret(encoded: &str, key: &[u8]) -> Result<String, WebhookError> {
    let cipher = cipher_for(key)?;

    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| WebhookError::Encryption(format!("base64 decode failed: {e}")))?;
    if bytes.len() <= NONCE_SIZE {
        return Err(WebhookError::Encryption(
            "stored secret is too short".to_string(),
        ));
    }

    let nonce = Nonce::from_slice(&bytes[..NONCE_SIZE]);
    let plaintext = cipher
        .decrypt(nonce, &bytes[NONCE_SIZE..])
        .map_err(|e| WebhookError::Encryption(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|e| WebhookError::Encryption(e.to_string()))
}

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm, WebhookError> {
    if key.len() != 32 {
        return Err(WebhookError::Encryption(format!(
            "invalid key length: expected 32 bytes, got {}",
            key.len()
        )));
    }
    Aes256Gcm::new_from_slice(key).map_err(|e| WebhookError::Encryption(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        [0x17u8; 32]
    }

    // --- signature tests ---

    #[test]
    fn test_valid_signature_accepted() {
        let body = br#"{"data":[{"id":"123"}]}"#;
        let header = format!("sha256={}", compute_signature("whsec-1", body));
        assert!(verify_signature(&header, "sha256", "whsec-1", body).is_ok());
    }

    #[test]
    fn test_flipped_byte_rejected() {
        let body = br#"{"data":[{"id":"123"}]}"#;
        let mut sig = compute_signature("whsec-1", body).into_bytes();
        sig[0] = if sig[0] == b'0' { b'1' } else { b'0' };
        let header = format!("sha256={}", String::from_utf8(sig).unwrap());

        let err = verify_signature(&header, "sha256", "whsec-1", body).unwrap_err();
        assert!(matches!(err, WebhookError::Verification(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"payload";
        let header = format!("sha256={}", compute_signature("whsec-1", body));
        assert!(verify_signature(&header, "sha256", "whsec-2", body).is_err());
    }

    #[test]
    fn test_missing_separator_rejected() {
        let err = verify_signature("deadbeef", "sha256", "whsec-1", b"x").unwrap_err();
        assert!(err.to_string().contains("separator"));
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let body = b"payload";
        let header = format!("sha1={}", compute_signature("whsec-1", body));
        let err = verify_signature(&header, "sha256", "whsec-1", body).unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_signature_covers_exact_body() {
        let header = format!("sha256={}", compute_signature("whsec-1", b"body"));
        assert!(verify_signature(&header, "sha256", "whsec-1", b"body ").is_err());
    }

    // --- secret-at-rest tests ---

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let encrypted = encrypt_secret("whsec-plain", &test_key()).unwrap();
        assert_eq!(decrypt_secret(&encrypted, &test_key()).unwrap(), "whsec-plain");
    }

    #[test]
    fn test_nonces_differ_between_calls() {
        let a = encrypt_secret("same", &test_key()).unwrap();
        let b = encrypt_secret("same", &test_key()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt_secret("whsec-plain", &test_key()).unwrap();
        assert!(decrypt_secret(&encrypted, &[0x18u8; 32]).is_err());
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        assert!(encrypt_secret("x", &[0u8; 16]).is_err());
    }
}
