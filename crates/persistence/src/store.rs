//! PostgreSQL implementation of the game storage seam.
//!
//! Each session wraps one `sqlx` transaction. Dropping a session without
//! committing rolls the transaction back when the connection returns to the
//! pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    AssetKey, CommentId, CourtId, GameFormat, InvitationId, ReservationId, UserId,
};
use domain::services::store::{InvitationDependents, NewCapacityRecord, NewInvitation};
use domain::services::{GameRecord, GameSession, GameStore, StoreError};
use sqlx::{PgPool, Postgres, Transaction};

use crate::repositories::{
    CapacityRecordRepository, CommentRepository, GameInviteRepository, GameRepository,
    PictureRepository, RegistrationRepository, ReservationRepository,
};

/// Game store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgGameStore {
    pool: PgPool,
    games: GameRepository,
}

impl PgGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            games: GameRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn begin(&self) -> Result<Box<dyn GameSession>, StoreError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgGameSession { tx }))
    }

    async fn find_game(
        &self,
        invitation_id: InvitationId,
    ) -> Result<Option<GameRecord>, StoreError> {
        self.games
            .find_by_invite(invitation_id)
            .await
            .map_err(map_sqlx_error)?
            .map(|entity| entity.into_domain())
            .transpose()
    }
}

/// One open transaction.
pub struct PgGameSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl GameSession for PgGameSession {
    async fn insert_picture(
        &mut self,
        key: &AssetKey,
        alt_description: &str,
    ) -> Result<u64, StoreError> {
        PictureRepository::insert(&mut self.tx, key.as_str(), alt_description)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_picture(&mut self, key: &AssetKey) -> Result<u64, StoreError> {
        PictureRepository::delete(&mut self.tx, key.as_str())
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_invitation(
        &mut self,
        invitation: &NewInvitation,
    ) -> Result<Option<InvitationId>, StoreError> {
        GameInviteRepository::insert(
            &mut self.tx,
            &invitation.title,
            &invitation.description,
            invitation.thumbnail.as_ref().map(AssetKey::as_str),
            invitation.creator,
        )
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_invitation_dependents(
        &mut self,
        invitation_id: InvitationId,
    ) -> Result<Option<InvitationDependents>, StoreError> {
        let Some(invite) = GameInviteRepository::find_by_id(&mut self.tx, invitation_id)
            .await
            .map_err(map_sqlx_error)?
        else {
            return Ok(None);
        };
        let comment_ids = GameInviteRepository::comment_ids(&mut self.tx, invitation_id)
            .await
            .map_err(map_sqlx_error)?;

        Ok(Some(InvitationDependents {
            thumbnail: invite.thumbnail.map(AssetKey::from_stored),
            comment_ids,
        }))
    }

    async fn delete_invitation(&mut self, invitation_id: InvitationId) -> Result<u64, StoreError> {
        GameInviteRepository::delete(&mut self.tx, invitation_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_comments(&mut self, comment_ids: &[CommentId]) -> Result<u64, StoreError> {
        CommentRepository::delete_with_replies(&mut self.tx, comment_ids)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_reservation(
        &mut self,
        court: &CourtId,
        booking_time: DateTime<Utc>,
    ) -> Result<Option<ReservationId>, StoreError> {
        ReservationRepository::insert(
            &mut self.tx,
            court.court_number,
            &court.address,
            &court.postal_code,
            booking_time,
        )
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<u64, StoreError> {
        ReservationRepository::delete(&mut self.tx, reservation_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_capacity_record(
        &mut self,
        record: &NewCapacityRecord,
    ) -> Result<u64, StoreError> {
        CapacityRecordRepository::insert(
            &mut self.tx,
            record.format,
            record.reservation_id,
            record.invitation_id,
            record.capacity,
            record.is_active,
        )
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_capacity_reservation(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<Option<ReservationId>, StoreError> {
        Ok(
            CapacityRecordRepository::find_by_invite(&mut self.tx, format, invitation_id)
                .await
                .map_err(map_sqlx_error)?
                .map(|record| record.reservation_id),
        )
    }

    async fn delete_capacity_record(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError> {
        CapacityRecordRepository::delete_by_invite(&mut self.tx, format, invitation_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_registration(
        &mut self,
        user_id: UserId,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError> {
        RegistrationRepository::insert(&mut self.tx, user_id, invitation_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn increment_enrollment(
        &mut self,
        format: GameFormat,
        invitation_id: InvitationId,
    ) -> Result<u64, StoreError> {
        CapacityRecordRepository::increment_enrollment(&mut self.tx, format, invitation_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}

/// Classifies a `sqlx` error by SQLSTATE.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(constraint),
                Some("23514") => StoreError::CheckViolation(constraint),
                Some("23503") => StoreError::ForeignKeyViolation(constraint),
                _ => StoreError::Database(db_err.message().to_string()),
            }
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}
