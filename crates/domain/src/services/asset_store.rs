//! Thumbnail asset store seam.
//!
//! Assets live outside the relational transaction: a stored asset is not
//! rolled back with the game, so callers compensate by deleting it.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::models::{AssetContent, AssetKey, AssetUpload};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Asset storage unavailable: {0}")]
    Unavailable(String),
}

/// Binary thumbnail storage.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Normalizes the upload to a thumbnail and stores it under a new key.
    async fn store(&self, upload: AssetUpload) -> Result<AssetKey, AssetError>;

    /// Returns a signed URL for `key` that stops working after `ttl`.
    async fn issue_access_url(&self, key: &AssetKey, ttl: Duration) -> Result<String, AssetError>;

    /// Removes `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &AssetKey) -> Result<(), AssetError>;

    /// Reads the stored bytes of `key`.
    async fn fetch(&self, key: &AssetKey) -> Result<AssetContent, AssetError>;
}

/// Builds the signed download URL shared by the asset store implementations.
pub fn signed_asset_url(
    base_url: &str,
    secret: &str,
    key: &AssetKey,
    ttl: Duration,
) -> Result<String, AssetError> {
    let expires = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| Utc::now().timestamp().checked_add(secs))
        .ok_or_else(|| AssetError::Unavailable(format!("URL lifetime out of range: {ttl:?}")))?;
    let signature = shared::crypto::sign_access(secret, key.as_str(), expires)
        .map_err(|e| AssetError::Unavailable(e.to_string()))?;
    Ok(format!(
        "{}/api/v1/assets/{}?expires={}&signature={}",
        base_url.trim_end_matches('/'),
        key,
        expires,
        signature
    ))
}

/// In-memory asset store for development and testing.
///
/// Stores uploads as-is. Failures can be switched on to exercise
/// compensation paths.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    assets: Mutex<HashMap<AssetKey, AssetContent>>,
    fail_store: AtomicBool,
    fail_delete: AtomicBool,
}

impl InMemoryAssetStore {
    /// Secret used to sign URLs issued by the in-memory store.
    pub const SIGNING_SECRET: &'static str = "in-memory-asset-secret";

    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `store` call fail.
    pub fn fail_store(&self, fail: bool) {
        self.fail_store.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `delete` call fail.
    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &AssetKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AssetKey, AssetContent>> {
        self.assets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn store(&self, upload: AssetUpload) -> Result<AssetKey, AssetError> {
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(AssetError::Unavailable("simulated store failure".into()));
        }
        if upload.bytes.is_empty() {
            return Err(AssetError::InvalidImage("empty upload".into()));
        }
        let key = AssetKey::generate();
        self.lock().insert(
            key.clone(),
            AssetContent {
                bytes: upload.bytes,
                content_type: upload.content_type,
            },
        );
        Ok(key)
    }

    async fn issue_access_url(&self, key: &AssetKey, ttl: Duration) -> Result<String, AssetError> {
        if !self.contains(key) {
            return Err(AssetError::NotFound(key.to_string()));
        }
        signed_asset_url("memory://assets", Self::SIGNING_SECRET, key, ttl)
    }

    async fn delete(&self, key: &AssetKey) -> Result<(), AssetError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AssetError::Unavailable("simulated delete failure".into()));
        }
        self.lock().remove(key);
        Ok(())
    }

    async fn fetch(&self, key: &AssetKey) -> Result<AssetContent, AssetError> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(key.to_string()))
    }
}
