//! In-memory implementation of the game storage seam.
//!
//! Sessions are serializable: a session holds the store lock from `begin`
//! until it is committed or dropped, and works on a private copy of the
//! state. Commit publishes the copy; drop discards it. Constraints mirror the
//! PostgreSQL schema closely enough for the workflows to observe the same
//! failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::store::{
    GameRecord, GameSession, GameStore, InvitationDependents, NewCapacityRecord, NewInvitation,
    StoreError,
};
use crate::models::{
    AssetKey, CommentId, CourtId, GameFormat, InvitationId, InvitationStatus, ReservationId,
    UserId,
};

/// Operations that can be told to fail or hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    InsertPicture,
    DeletePicture,
    InsertInvitation,
    FindInvitationDependents,
    DeleteInvitation,
    DeleteComments,
    InsertReservation,
    DeleteReservation,
    InsertCapacityRecord,
    FindCapacityReservation,
    DeleteCapacityRecord,
    InsertRegistration,
    IncrementEnrollment,
    Commit,
    FindGame,
}

#[derive(Debug, Clone)]
enum Fault {
    Fail(StoreError),
    Stall,
    /// Commit only: publish the working copy, then never acknowledge.
    StallAfterApply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationRow {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<AssetKey>,
    pub creator: UserId,
    pub status: InvitationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRow {
    pub court: CourtId,
    pub booking_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityRow {
    pub reservation_id: ReservationId,
    pub capacity: i32,
    pub currently_enrolled: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub invite_id: InvitationId,
    pub content: String,
    pub parent_id: Option<CommentId>,
}

/// Committed contents of an [`InMemoryGameStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    next_id: i64,
    pub pictures: BTreeMap<AssetKey, String>,
    pub invitations: BTreeMap<InvitationId, InvitationRow>,
    pub reservations: BTreeMap<ReservationId, ReservationRow>,
    pub games: BTreeMap<(GameFormat, InvitationId), CapacityRow>,
    pub comments: BTreeMap<CommentId, CommentRow>,
    pub registrations: BTreeSet<(UserId, InvitationId)>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn invitation_has_game(&self, invitation_id: InvitationId) -> bool {
        GameFormat::ALL
            .iter()
            .any(|format| self.games.contains_key(&(*format, invitation_id)))
    }
}

/// In-memory game store for development and testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGameStore {
    state: Arc<AsyncMutex<MemoryState>>,
    faults: Arc<Mutex<HashMap<FailPoint, Fault>>>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `point` fail with `error` until cleared.
    pub fn fail_on(&self, point: FailPoint, error: StoreError) {
        self.lock_faults().insert(point, Fault::Fail(error));
    }

    /// Makes `point` never complete until cleared.
    pub fn stall_on(&self, point: FailPoint) {
        self.lock_faults().insert(point, Fault::Stall);
    }

    /// Makes commits apply their changes and then hang, like a database
    /// whose acknowledgement is lost.
    pub fn stall_after_commit(&self) {
        self.lock_faults()
            .insert(FailPoint::Commit, Fault::StallAfterApply);
    }

    pub fn clear_failures(&self) {
        self.lock_faults().clear();
    }

    /// Copy of the committed state. Waits for any open session to finish.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    /// Adds a committed comment on an invitation, optionally as a reply.
    pub async fn add_comment(
        &self,
        invite_id: InvitationId,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> CommentId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.comments.insert(
            id,
            CommentRow {
                invite_id,
                content: content.to_string(),
                parent_id,
            },
        );
        id
    }

    fn lock_faults(&self) -> std::sync::MutexGuard<'_, HashMap<FailPoint, Fault>> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn begin(&self) -> Result<Box<dyn GameSession>, StoreError> {
        check_fault(&self.faults, FailPoint::Begin).await?;
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemorySession {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    async fn find_game(
        &self,
        invitation_id: InvitationId,
    ) -> Result<Option<GameRecord>, StoreError> {
        check_fault(&self.faults, FailPoint::FindGame).await?;
        let state = self.state.lock().await;
        let Some(invitation) = state.invitations.get(&invitation_id) else {
            return Ok(None);
        };
        let found = GameFormat::ALL.iter().find_map(|format| {
            state
                .games
                .get(&(*format, invitation_id))
                .map(|game| (*format, game))
        });
        let Some((format, game)) = found else {
            return Ok(None);
        };
        let Some(reservation) = state.reservations.get(&game.reservation_id) else {
            return Ok(None);
        };

        Ok(Some(GameRecord {
            invitation_id,
            reservation_id: game.reservation_id,
            title: invitation.title.clone(),
            description: invitation.description.clone(),
            status: invitation.status,
            creator: invitation.creator,
            format,
            capacity: game.capacity,
            currently_enrolled: game.currently_enrolled,
            is_active: game.is_active,
            court: reservation.court.clone(),
            booking_time: reservation.booking_time,
            thumbnail_alt: invitation
                .thumbnail
                .as_ref()
                .and_then(|key| state.pictures.get(key).cloned()),
            thumbnail: invitation.thumbnail.clone(),
        }))
    }
}

async fn check_fault(
    faults: &Mutex<HashMap<FailPoint, Fault>>,
    point: FailPoint,
) -> Result<(), StoreError> {
    let fault = faults
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(&point)
        .cloned();
    match fault {
        Some(Fault::Fail(err)) => Err(err),
        Some(Fault::Stall) => {
            std::future::pending::<()>().await;
            Ok(())
        }
        Some(Fault::StallAfterApply) | None => Ok(()),
    }
}

struct MemorySession {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Mutex<HashMap<FailPoint, Fault>>>,
}

impl MemorySession {
    async fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        check_fault(&self.faults, point).await
    }
}

#[async_trait]
impl GameSession for MemorySession {
    async fn insert_picture(
        &mut self,
        key: &AssetKey,
        alt_description: &str,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::InsertPicture).await?;
        if self.working.pictures.contains_key(key) {
            return Err(StoreError::UniqueViolation("pictures_pkey".into()));
        }
        self.working
            .pictures
            .insert(key.clone(), alt_description.to_string());
        Ok(1)
    }

    async fn delete_picture(&mut self, key: &AssetKey) -> Result<u64, StoreError> {
        self.check(FailPoint::DeletePicture).await?;
        let referenced = self
            .working
            .invitations
            .values()
            .any(|row| row.thumbnail.as_ref() == Some(key));
        if referenced {
            return Err(StoreError::ForeignKeyViolation(
                "game_invites_thumbnail_fkey".into(),
            ));
        }
        Ok(u64::from(self.working.pictures.remove(key).is_some()))
    }

    async fn insert_invitation(
        &mut self,
        invitation: &NewInvitation,
    ) -> Result<Option<InvitationId>, StoreError> {
        self.check(FailPoint::InsertInvitation).await?;
        if let Some(key) = &invitation.thumbnail {
            if !self.working.pictures.contains_key(key) {
                return Err(StoreError::ForeignKeyViolation(
                    "game_invites_thumbnail_fkey".into(),
                ));
            }
        }
        let id = self.working.next_id();
        self.working.invitations.insert(
            id,
            InvitationRow {
                title: invitation.title.clone(),
                description: invitation.description.clone(),
                thumbnail: invitation.thumbnail.clone(),
                creator: invitation.creator,
                status: InvitationStatus::Open,
            },
        );
        Ok(Some(id))
    }

    async fn find_invitation_dependents(
        &mut self,
        invitation_id: InvitationId,
    ) -> Result<Option<InvitationDependents>, StoreError> {
        self.check(FailPoint::FindInvitationDependents).await?;
        Ok(self.working.invitations.get(&invitation_id).map(|row| {
            InvitationDependents {
                thumbnail: row.thumbnail.clone(),
                comment_ids: self
                    .working
                    .comments
                    .iter()
                    .filter(|(_, c)| c.invite_id == invitation_id)
                    .map(|(id, _)| *id)
                    .collect(),
            }
        }))
    }

    async fn delete_invitation(&mut self, invitation_id: InvitationId) -> Result<u64, StoreError> {
        self.check(FailPoint::DeleteInvitation).await?;
        if self.working.invitation_has_game(invitation_id) {
            return Err(StoreError::ForeignKeyViolation(
                "games_game_invite_id_fkey".into(),
            ));
        }
        let removed = self.working.invitations.remove(&invitation_id).is_some();
        if removed {
            self.working
                .registrations
                .retain(|(_, invite)| *invite != invitation_id);
        }
        Ok(u64::from(removed))
    }

    async fn delete_comments(&mut self, comment_ids: &[CommentId]) -> Result<u64, StoreError> {
        self.check(FailPoint::DeleteComments).await?;
        let before = self.working.comments.len();
        self.working.comments.retain(|id, comment| {
            !comment_ids.contains(id)
                && !comment
                    .parent_id
                    .map(|parent| comment_ids.contains(&parent))
                    .unwrap_or(false)
        });
        Ok((before - self.working.comments.len()) as u64)
    }

    async fn insert_reservation(
        &mut self,
        court: &CourtId,
        booking_time: DateTime<Utc>,
    ) -> Result<Option<ReservationId>, StoreError> {
        self.check(FailPoint::InsertReservation).await?;
        let taken = self
            .working
            .reservations
            .values()
            .any(|r| &r.court == court && r.booking_time == booking_time);
        if taken {
            return Err(StoreError::UniqueViolation("reservation_slot_key".into()));
        }
        let id = self.working.next_id();
        self.working.reservations.insert(
            id,
            ReservationRow {
                court: court.clone(),
                booking_time,
            },
        );
        Ok(Some(id))
    }

    async fn delete_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::DeleteReservation).await?;
        let referenced = self
            .working
            .games
            .values()
            .any(|g| g.reservation_id == reservation_id);
        if referenced {
            return Err(StoreError::ForeignKeyViolation(
                "games_reservation_id_fkey".into(),
            ));
        }
        Ok(u64::from(
            self.working.reservations.remove(&reservation_id).is_some(),
        ))
    }

    async fn insert_capacity_record(
        &mut self,
        record: &NewCapacityRecord,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::InsertCapacityRecord).await?;
        if record.capacity < 1 {
            return Err(StoreError::CheckViolation(format!(
                "{}_capacity_check",
                record.format
            )));
        }
        if !self.working.invitations.contains_key(&record.invitation_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "{}_game_invite_id_fkey",
                record.format
            )));
        }
        if !self.working.reservations.contains_key(&record.reservation_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "{}_reservation_id_fkey",
                record.format
            )));
        }
        let key = (record.format, record.invitation_id);
        if self.working.games.contains_key(&key) {
            return Err(StoreError::UniqueViolation(format!(
                "{}_game_invite_id_key",
                record.format
            )));
        }
        self.working.games.insert(
            key,
            CapacityRow {
                reservation_id: record.reservation_id,
                capacity: record.capacity,
                currently_enrolled: 1,
                is_active: record.is_active,
            },
        );
        Ok(1)
    }

    async fn find_capacity_reservation(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<Option<ReservationId>, StoreError> {
        self.check(FailPoint::FindCapacityReservation).await?;
        Ok(self
            .working
            .games
            .get(&(format, invitation_id))
            .map(|g| g.reservation_id))
    }

    async fn delete_capacity_record(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::DeleteCapacityRecord).await?;
        Ok(u64::from(
            self.working.games.remove(&(format, invitation_id)).is_some(),
        ))
    }

    async fn insert_registration(
        &mut self,
        user_id: UserId,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::InsertRegistration).await?;
        if !self.working.invitations.contains_key(&invitation_id) {
            return Err(StoreError::ForeignKeyViolation(
                "registers_invite_id_fkey".into(),
            ));
        }
        if !self.working.registrations.insert((user_id, invitation_id)) {
            return Err(StoreError::UniqueViolation("registers_pkey".into()));
        }
        Ok(1)
    }

    async fn increment_enrollment(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::IncrementEnrollment).await?;
        match self.working.games.get_mut(&(format, invitation_id)) {
            Some(game) if game.currently_enrolled < game.capacity => {
                game.currently_enrolled += 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.check(FailPoint::Commit).await?;
        let MemorySession {
            mut guard,
            working,
            faults,
        } = *self;
        *guard = working;
        drop(guard);

        let lost_ack = matches!(
            faults
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(&FailPoint::Commit),
            Some(Fault::StallAfterApply)
        );
        if lost_ack {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
