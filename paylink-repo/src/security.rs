//! Security utilities for webhook signatures and API key checks.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hashes an API key using SHA-256.
pub fn hash_api_key(key: &str) -> String {
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(hash)
}

/// Verifies a presented API key against the configured key.
///
/// Both sides are hashed first so the constant-time comparison always runs
/// over equal-length values.
pub fn verify_api_key(input: &str, configured: &str) -> bool {
    let input_hash = hash_api_key(input);
    let configured_hash = hash_api_key(configured);
    input_hash.as_bytes().ct_eq(configured_hash.as_bytes()).into()
}

/// Signs a webhook payload using HMAC-SHA256.
pub fn sign_webhook(payload: &[u8], secret: &str) -> String {
    use hmac::{Hmac, Mac};

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a webhook signature using constant-time comparison.
///
/// The signature is computed over the exact received payload bytes, never a
/// re-serialized form.
pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let expected = sign_webhook(payload, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_verification() {
        assert!(verify_api_key("sk_live_abc123", "sk_live_abc123"));
        assert!(!verify_api_key("wrong_key", "sk_live_abc123"));
        assert!(!verify_api_key("", "sk_live_abc123"));
    }

    #[test]
    fn test_webhook_signing() {
        let payload = br#"{"transactionId":"FAP-1","status":"SUCCESSFUL"}"#;
        let secret = "webhook_secret_123";

        let signature = sign_webhook(payload, secret);
        assert!(verify_webhook_signature(payload, &signature, secret));
        assert!(!verify_webhook_signature(
            payload,
            &signature,
            "wrong_secret"
        ));
        assert!(!verify_webhook_signature(b"tampered", &signature, secret));
    }

    #[test]
    fn test_signature_is_over_exact_bytes() {
        let secret = "s";
        // Same JSON, different whitespace - different signature.
        let a = sign_webhook(br#"{"status":"SUCCESS"}"#, secret);
        let b = sign_webhook(br#"{ "status": "SUCCESS" }"#, secret);
        assert_ne!(a, b);
    }
}
