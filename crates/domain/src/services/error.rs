//! Error taxonomy for the game workflows.

use thiserror::Error;

use super::asset_store::AssetError;
use super::store::StoreError;

/// Failure of a game operation.
///
/// The `Display` text of the user-facing variants is the message shown to
/// clients; storage variants are logged and replaced by a generic message.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot book for a past date. Please book a different time.")]
    InvalidTime,

    #[error("Please ensure Game capacity is at least 1.")]
    CapacityTooLow,

    #[error("Court already booked at given time.")]
    Conflict,

    #[error("Court does not exist.")]
    CourtNotFound,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Game doesn't exist.")]
    GameNotFound,

    #[error("Game is already full.")]
    GameFull,

    #[error("User is already registered for this game.")]
    AlreadyRegistered,

    #[error("Insert failed: {0}")]
    InsertFailed(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => GameError::StorageUnavailable(msg),
            other => GameError::Storage(other.to_string()),
        }
    }
}
