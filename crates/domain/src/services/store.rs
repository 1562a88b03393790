//! Transactional storage seam for the game workflows.
//!
//! A [`GameStore`] hands out one [`GameSession`] per workflow invocation. A
//! session is a single transaction: nothing it writes is visible to other
//! sessions until [`GameSession::commit`], and dropping an uncommitted
//! session rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    AssetKey, CommentId, CourtId, GameFormat, InvitationId, InvitationStatus, ReservationId,
    UserId,
};

/// Storage-level failure, classified from the backend's error codes.
///
/// Constraint variants carry the constraint name when the backend reports one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Invitation row to insert.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<AssetKey>,
    pub creator: UserId,
}

/// Singles/doubles row to insert. `currently_enrolled` always starts at 1.
#[derive(Debug, Clone)]
pub struct NewCapacityRecord {
    pub reservation_id: ReservationId,
    pub invitation_id: InvitationId,
    pub capacity: i32,
    pub format: GameFormat,
    pub is_active: bool,
}

/// Rows that depend on an invitation and must go when it goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvitationDependents {
    pub thumbnail: Option<AssetKey>,
    pub comment_ids: Vec<CommentId>,
}

/// A game joined with its invitation, reservation and picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub invitation_id: InvitationId,
    pub reservation_id: ReservationId,
    pub title: String,
    pub description: String,
    pub status: InvitationStatus,
    pub creator: UserId,
    pub format: GameFormat,
    pub capacity: i32,
    pub currently_enrolled: i32,
    pub is_active: bool,
    pub court: CourtId,
    pub booking_time: DateTime<Utc>,
    pub thumbnail: Option<AssetKey>,
    pub thumbnail_alt: Option<String>,
}

/// Source of transactional sessions.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Opens a new transaction.
    async fn begin(&self) -> Result<Box<dyn GameSession>, StoreError>;

    /// Reads a committed game outside any transaction.
    async fn find_game(&self, invitation_id: InvitationId)
        -> Result<Option<GameRecord>, StoreError>;
}

/// One open transaction against the primary store.
///
/// Mutating methods return the number of affected rows; inserts that generate
/// an identifier return `None` when no identifier came back.
#[async_trait]
pub trait GameSession: Send {
    async fn insert_picture(
        &mut self,
        key: &AssetKey,
        alt_description: &str,
    ) -> Result<u64, StoreError>;

    async fn delete_picture(&mut self, key: &AssetKey) -> Result<u64, StoreError>;

    async fn insert_invitation(
        &mut self,
        invitation: &NewInvitation,
    ) -> Result<Option<InvitationId>, StoreError>;

    async fn find_invitation_dependents(
        &mut self,
        invitation_id: InvitationId,
    ) -> Result<Option<InvitationDependents>, StoreError>;

    async fn delete_invitation(&mut self, invitation_id: InvitationId) -> Result<u64, StoreError>;

    /// Deletes the given comments together with their replies.
    async fn delete_comments(&mut self, comment_ids: &[CommentId]) -> Result<u64, StoreError>;

    async fn insert_reservation(
        &mut self,
        court: &CourtId,
        booking_time: DateTime<Utc>,
    ) -> Result<Option<ReservationId>, StoreError>;

    async fn delete_reservation(&mut self, reservation_id: ReservationId)
        -> Result<u64, StoreError>;

    async fn insert_capacity_record(
        &mut self,
        record: &NewCapacityRecord,
    ) -> Result<u64, StoreError>;

    async fn find_capacity_reservation(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<Option<ReservationId>, StoreError>;

    async fn delete_capacity_record(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError>;

    async fn insert_registration(
        &mut self,
        user_id: UserId,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError>;

    /// Increments `currently_enrolled` only while it is below capacity.
    async fn increment_enrollment(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError>;

    /// Commits every write made through this session.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
