//! Court reservations: one booking per court and time slot.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::error::GameError;
use super::store::{GameSession, StoreError};
use crate::models::{CourtId, ReservationId};

/// Creates and removes court reservations inside a workflow session.
pub struct ReservationLedger;

impl ReservationLedger {
    /// Books `court` at `booking_time`.
    ///
    /// Times at or before `now` are rejected before touching storage. A taken
    /// slot maps to [`GameError::Conflict`].
    pub async fn create(
        session: &mut dyn GameSession,
        court: &CourtId,
        booking_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ReservationId, GameError> {
        if booking_time <= now {
            return Err(GameError::InvalidTime);
        }

        match session.insert_reservation(court, booking_time).await {
            Ok(Some(id)) => {
                debug!(reservation_id = id, court_number = court.court_number, "Reservation created");
                Ok(id)
            }
            Ok(None) => Err(GameError::InsertFailed(
                "Reservation was not inserted".to_string(),
            )),
            Err(StoreError::UniqueViolation(_)) => Err(GameError::Conflict),
            Err(StoreError::ForeignKeyViolation(_)) => Err(GameError::CourtNotFound),
            Err(StoreError::CheckViolation(constraint))
                if constraint.contains("booking_time") =>
            {
                Err(GameError::InvalidTime)
            }
            Err(StoreError::Unavailable(msg)) => Err(GameError::StorageUnavailable(msg)),
            Err(e) => Err(GameError::InsertFailed(e.to_string())),
        }
    }

    /// Releases a reservation. Nothing deleted means it did not exist.
    pub async fn delete(
        session: &mut dyn GameSession,
        reservation_id: ReservationId,
    ) -> Result<(), GameError> {
        let rows = session.delete_reservation(reservation_id).await?;
        if rows == 0 {
            return Err(GameError::NotFound(format!(
                "Reservation {reservation_id} doesn't exist."
            )));
        }
        Ok(())
    }
}
