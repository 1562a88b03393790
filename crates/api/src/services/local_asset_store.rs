//! Filesystem-backed asset store.
//!
//! Thumbnails are written as `<key>.png` under the configured directory.
//! Writes go to a temporary file first and are renamed into place.

use async_trait::async_trait;
use domain::models::{AssetContent, AssetKey, AssetUpload};
use domain::services::asset_store::signed_asset_url;
use domain::services::{AssetError, AssetStore};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::thumbnail::{make_thumbnail, THUMBNAIL_CONTENT_TYPE};
use crate::config::AssetsConfig;

pub struct LocalAssetStore {
    root: PathBuf,
    public_base_url: String,
    signing_secret: String,
    thumbnail_size: u32,
}

impl LocalAssetStore {
    /// Opens the store, creating the storage directory when missing.
    pub async fn open(config: &AssetsConfig) -> Result<Self, AssetError> {
        let root = PathBuf::from(&config.storage_dir);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| AssetError::Unavailable(format!("{}: {}", root.display(), e)))?;

        Ok(Self {
            root,
            public_base_url: config.public_base_url.clone(),
            signing_secret: config.signing_secret.clone(),
            thumbnail_size: config.thumbnail_size,
        })
    }

    fn path_for(&self, key: &AssetKey) -> PathBuf {
        self.root.join(format!("{}.png", key))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(&self, upload: AssetUpload) -> Result<AssetKey, AssetError> {
        let size = self.thumbnail_size;
        let bytes = tokio::task::spawn_blocking(move || make_thumbnail(&upload.bytes, size))
            .await
            .map_err(|e| AssetError::Unavailable(format!("thumbnail task failed: {}", e)))?
            .map_err(|e| AssetError::InvalidImage(e.to_string()))?;

        let key = AssetKey::generate();
        let path = self.path_for(&key);
        let staging = self.root.join(format!(".{}.tmp", key));

        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|e| AssetError::Unavailable(e.to_string()))?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(AssetError::Unavailable(e.to_string()));
        }

        debug!(key = %key, bytes = bytes.len(), "Thumbnail stored");
        Ok(key)
    }

    async fn issue_access_url(&self, key: &AssetKey, ttl: Duration) -> Result<String, AssetError> {
        match tokio::fs::metadata(self.path_for(key)).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AssetError::NotFound(key.to_string()))
            }
            Err(e) => return Err(AssetError::Unavailable(e.to_string())),
        }
        signed_asset_url(&self.public_base_url, &self.signing_secret, key, ttl)
    }

    async fn delete(&self, key: &AssetKey) -> Result<(), AssetError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                debug!(key = %key, "Thumbnail deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AssetError::Unavailable(e.to_string())),
        }
    }

    async fn fetch(&self, key: &AssetKey) -> Result<AssetContent, AssetError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(AssetContent {
                bytes,
                content_type: THUMBNAIL_CONTENT_TYPE.to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AssetError::NotFound(key.to_string())),
            Err(e) => Err(AssetError::Unavailable(e.to_string())),
        }
    }
}
