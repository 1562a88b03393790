//! Per-format game rows tracking capacity and enrollment.
//!
//! A game lives in exactly one of the format tables; lookups and deletes
//! therefore probe every format.

use tracing::debug;

use super::error::GameError;
use super::store::{GameSession, NewCapacityRecord, StoreError};
use crate::models::{GameFormat, InvitationId, ReservationId, UserId};

/// Creates, finds and removes capacity records inside a workflow session.
pub struct CapacityRecord;

impl CapacityRecord {
    /// Inserts the capacity record for a game with the creator enrolled.
    pub async fn create(
        session: &mut dyn GameSession,
        reservation_id: ReservationId,
        invitation_id: InvitationId,
        capacity: i32,
        format: GameFormat,
        is_active: bool,
    ) -> Result<(), GameError> {
        if capacity < 1 {
            return Err(GameError::CapacityTooLow);
        }

        let record = NewCapacityRecord {
            reservation_id,
            invitation_id,
            capacity,
            format,
            is_active,
        };

        match session.insert_capacity_record(&record).await {
            Ok(0) => Err(GameError::InsertFailed("Game was not inserted".to_string())),
            Ok(_) => {
                debug!(invitation_id, %format, capacity, "Capacity record created");
                Ok(())
            }
            Err(StoreError::CheckViolation(constraint))
                if constraint.is_empty() || constraint.ends_with("capacity_check") =>
            {
                Err(GameError::CapacityTooLow)
            }
            Err(StoreError::Unavailable(msg)) => Err(GameError::StorageUnavailable(msg)),
            Err(e) => Err(GameError::InsertFailed(e.to_string())),
        }
    }

    /// Reservation backing the game created from `invitation_id`.
    pub async fn find_reservation_id(
        session: &mut dyn GameSession,
        invitation_id: InvitationId,
    ) -> Result<ReservationId, GameError> {
        Self::locate(session, invitation_id)
            .await?
            .map(|(_, reservation_id)| reservation_id)
            .ok_or(GameError::GameNotFound)
    }

    /// Deletes the game row in whichever format table holds it.
    pub async fn delete(
        session: &mut dyn GameSession,
        invitation_id: InvitationId,
    ) -> Result<(), GameError> {
        let mut rows = 0;
        for format in GameFormat::ALL {
            rows += session.delete_capacity_record(format, invitation_id).await?;
        }
        if rows == 0 {
            return Err(GameError::NotFound(format!(
                "Game {invitation_id} doesn't exist."
            )));
        }
        debug!(invitation_id, "Capacity record deleted");
        Ok(())
    }

    /// Registers `user_id` for the game and takes one seat.
    pub async fn enroll(
        session: &mut dyn GameSession,
        invitation_id: InvitationId,
        user_id: UserId,
    ) -> Result<(), GameError> {
        let (format, _) = Self::locate(session, invitation_id)
            .await?
            .ok_or(GameError::GameNotFound)?;

        match session.insert_registration(user_id, invitation_id).await {
            Ok(_) => {}
            Err(StoreError::UniqueViolation(_)) => return Err(GameError::AlreadyRegistered),
            Err(StoreError::ForeignKeyViolation(_)) => {
                return Err(GameError::NotFound(format!("User {user_id} doesn't exist.")))
            }
            Err(e) => return Err(e.into()),
        }

        if session.increment_enrollment(format, invitation_id).await? == 0 {
            return Err(GameError::GameFull);
        }
        debug!(invitation_id, user_id, %format, "User enrolled");
        Ok(())
    }

    async fn locate(
        session: &mut dyn GameSession,
        invitation_id: InvitationId,
    ) -> Result<Option<(GameFormat, ReservationId)>, GameError> {
        for format in GameFormat::ALL {
            if let Some(id) = session
                .find_capacity_reservation(format, invitation_id)
                .await?
            {
                return Ok(Some((format, id)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourtId;
    use crate::services::memory_store::InMemoryGameStore;
    use crate::services::store::{GameStore, NewInvitation};
    use chrono::{Duration, Utc};

    async fn seed(session: &mut dyn GameSession) -> (InvitationId, ReservationId) {
        let invite = session
            .insert_invitation(&NewInvitation {
                title: "Pickup".into(),
                description: String::new(),
                thumbnail: None,
                creator: 1,
            })
            .await
            .unwrap()
            .unwrap();
        let court = CourtId {
            court_number: 2,
            address: "1 Court Rd".into(),
            postal_code: "M5V2T6".into(),
        };
        let reservation = session
            .insert_reservation(&court, Utc::now() + Duration::days(1))
            .await
            .unwrap()
            .unwrap();
        (invite, reservation)
    }

    #[tokio::test]
    async fn test_create_rejects_zero_capacity() {
        let store = InMemoryGameStore::new();
        let mut session = store.begin().await.unwrap();
        let (invite, reservation) = seed(session.as_mut()).await;

        let result = CapacityRecord::create(
            session.as_mut(),
            reservation,
            invite,
            0,
            GameFormat::Singles,
            true,
        )
        .await;
        assert!(matches!(result, Err(GameError::CapacityTooLow)));
    }

    #[tokio::test]
    async fn test_find_and_delete_across_formats() {
        let store = InMemoryGameStore::new();
        let mut session = store.begin().await.unwrap();
        let (invite, reservation) = seed(session.as_mut()).await;
        CapacityRecord::create(
            session.as_mut(),
            reservation,
            invite,
            4,
            GameFormat::Doubles,
            true,
        )
        .await
        .unwrap();

        let found = CapacityRecord::find_reservation_id(session.as_mut(), invite)
            .await
            .unwrap();
        assert_eq!(found, reservation);

        CapacityRecord::delete(session.as_mut(), invite).await.unwrap();
        let again = CapacityRecord::delete(session.as_mut(), invite).await;
        match again {
            Err(GameError::NotFound(msg)) => assert_eq!(msg, format!("Game {invite} doesn't exist.")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enroll_until_full() {
        let store = InMemoryGameStore::new();
        let mut session = store.begin().await.unwrap();
        let (invite, reservation) = seed(session.as_mut()).await;
        CapacityRecord::create(
            session.as_mut(),
            reservation,
            invite,
            2,
            GameFormat::Singles,
            true,
        )
        .await
        .unwrap();

        CapacityRecord::enroll(session.as_mut(), invite, 2).await.unwrap();

        let dup = CapacityRecord::enroll(session.as_mut(), invite, 2).await;
        assert!(matches!(dup, Err(GameError::AlreadyRegistered)));

        let full = CapacityRecord::enroll(session.as_mut(), invite, 3).await;
        assert!(matches!(full, Err(GameError::GameFull)));
    }

    #[tokio::test]
    async fn test_enroll_unknown_game() {
        let store = InMemoryGameStore::new();
        let mut session = store.begin().await.unwrap();

        let result = CapacityRecord::enroll(session.as_mut(), 5, 1).await;
        assert!(matches!(result, Err(GameError::GameNotFound)));
    }
}
