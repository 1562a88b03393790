//! Signed thumbnail download.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use domain::models::AssetKey;
use domain::services::AssetError;
use serde::Deserialize;
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AssetAccessQuery {
    pub expires: i64,
    pub signature: String,
}

/// Serve a stored thumbnail if the link is signed and not expired.
///
/// GET /api/v1/assets/:key?expires=&signature=
pub async fn get_asset(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<AssetAccessQuery>,
) -> Result<Response, ApiError> {
    let key = AssetKey::parse(&key).ok_or_else(|| ApiError::NotFound("Asset not found".into()))?;

    let now = Utc::now().timestamp();
    if query.expires <= now {
        return Err(ApiError::Forbidden("Link has expired".into()));
    }

    shared::crypto::verify_access(
        &state.config.assets.signing_secret,
        key.as_str(),
        query.expires,
        &query.signature,
    )
    .map_err(|e| {
        debug!(key = %key, error = %e, "Rejected asset signature");
        ApiError::Forbidden("Invalid signature".into())
    })?;

    let content = state
        .workflow
        .assets()
        .fetch(&key)
        .await
        .map_err(|e| match e {
            AssetError::NotFound(_) => ApiError::NotFound("Asset not found".into()),
            other => ApiError::Internal(other.to_string()),
        })?;

    let max_age = (query.expires - now).max(0);
    Ok((
        [
            (header::CONTENT_TYPE, content.content_type),
            (header::CACHE_CONTROL, format!("private, max-age={}", max_age)),
        ],
        content.bytes,
    )
        .into_response())
}
