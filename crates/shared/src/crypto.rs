//! Cryptographic utilities for asset keys and signed access URLs.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in a generated asset key.
pub const ASSET_KEY_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Invalid signing secret")]
    InvalidSecret,

    #[error("Signature is not valid hex")]
    Malformed,

    #[error("Signature mismatch")]
    Mismatch,
}

/// Generates a random asset key: 32 random bytes, hex encoded (64 chars).
pub fn generate_asset_key() -> String {
    let mut bytes = [0u8; ASSET_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Returns true if `key` has the shape of a generated asset key.
///
/// Keys end up in filesystem paths, so anything other than lowercase hex of
/// the right length is rejected.
pub fn is_valid_asset_key(key: &str) -> bool {
    key.len() == ASSET_KEY_BYTES * 2
        && key
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn access_mac(secret: &str, key: &str, expires: i64) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(key.as_bytes());
    mac.update(b":");
    mac.update(expires.to_string().as_bytes());
    Ok(mac)
}

/// Signs `key:expires` with HMAC-SHA256 and returns the hex signature.
pub fn sign_access(secret: &str, key: &str, expires: i64) -> Result<String, SignatureError> {
    let mac = access_mac(secret, key, expires)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a signature produced by [`sign_access`] in constant time.
pub fn verify_access(
    secret: &str,
    key: &str,
    expires: i64,
    signature: &str,
) -> Result<(), SignatureError> {
    let expected = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;
    access_mac(secret, key, expires)?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_asset_key_shape() {
        let key = generate_asset_key();
        assert_eq!(key.len(), 64);
        assert!(is_valid_asset_key(&key));
    }

    #[test]
    fn test_generate_asset_key_unique() {
        let a = generate_asset_key();
        let b = generate_asset_key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_valid_asset_key_rejects_paths() {
        assert!(!is_valid_asset_key("../etc/passwd"));
        assert!(!is_valid_asset_key(""));
        assert!(!is_valid_asset_key(&"A".repeat(64)));
        assert!(!is_valid_asset_key(&"a".repeat(63)));
    }

    #[test]
    fn test_sign_and_verify() {
        let sig = sign_access("secret", "abc", 1_700_000_000).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_access("secret", "abc", 1_700_000_000, &sig).is_ok());
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let sig = sign_access("secret", "abc", 1_700_000_000).unwrap();
        assert!(matches!(
            verify_access("secret", "abc", 1_700_000_001, &sig),
            Err(SignatureError::Mismatch)
        ));
        assert!(matches!(
            verify_access("other", "abc", 1_700_000_000, &sig),
            Err(SignatureError::Mismatch)
        ));
        assert!(matches!(
            verify_access("secret", "abc", 1_700_000_000, "zz"),
            Err(SignatureError::Malformed)
        ));
    }
}
