//! Thumbnail asset models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key of a stored asset (64 lowercase hex chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self(shared::crypto::generate_asset_key())
    }

    /// Parses a key received from outside, rejecting anything that is not a
    /// generated key.
    pub fn parse(value: &str) -> Option<Self> {
        shared::crypto::is_valid_asset_key(value).then(|| Self(value.to_string()))
    }

    /// Wraps a key read back from storage without validation.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An uploaded thumbnail before it is stored.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Alt text, taken from the original file name.
    pub alt_text: String,
}

/// Bytes of a stored asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_parseable() {
        let key = AssetKey::generate();
        assert_eq!(AssetKey::parse(key.as_str()), Some(key));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AssetKey::parse("../../secret").is_none());
        assert!(AssetKey::parse("").is_none());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = AssetKey::from_stored("abc".to_string());
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"abc\"");
    }
}
