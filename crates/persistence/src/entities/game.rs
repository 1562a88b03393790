//! Game entities: invitations, capacity records and the joined detail row.

use chrono::{DateTime, Utc};
use domain::models::{AssetKey, CourtId, GameFormat, InvitationStatus};
use domain::services::{GameRecord, StoreError};
use sqlx::FromRow;

/// Database row mapping for the game_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct GameInviteEntity {
    pub invite_id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub creator: i64,
    pub status: i16,
    pub created_at: DateTime<Utc>,
}

/// Database row mapping shared by the singles and doubles tables.
#[derive(Debug, Clone, FromRow)]
pub struct CapacityRecordEntity {
    pub game_id: i64,
    pub reservation_id: i64,
    pub game_invite_id: i64,
    pub currently_enrolled: i32,
    pub capacity: i32,
    pub is_active: bool,
}

/// A game joined across its invitation, format table, reservation and picture.
#[derive(Debug, Clone, FromRow)]
pub struct GameDetailEntity {
    pub invite_id: i64,
    pub title: String,
    pub description: String,
    pub status: i16,
    pub creator: i64,
    pub format: String,
    pub capacity: i32,
    pub currently_enrolled: i32,
    pub is_active: bool,
    pub reservation_id: i64,
    pub court_number: i32,
    pub address: String,
    pub postal_code: String,
    pub booking_time: DateTime<Utc>,
    pub thumbnail: Option<String>,
    pub thumbnail_alt: Option<String>,
}

impl GameDetailEntity {
    pub fn into_domain(self) -> Result<GameRecord, StoreError> {
        let format: GameFormat = self.format.parse().map_err(StoreError::Database)?;
        Ok(GameRecord {
            invitation_id: self.invite_id,
            reservation_id: self.reservation_id,
            title: self.title,
            description: self.description,
            status: InvitationStatus::from_code(self.status),
            creator: self.creator,
            format,
            capacity: self.capacity,
            currently_enrolled: self.currently_enrolled,
            is_active: self.is_active,
            court: CourtId {
                court_number: self.court_number,
                address: self.address,
                postal_code: self.postal_code,
            },
            booking_time: self.booking_time,
            thumbnail: self.thumbnail.map(AssetKey::from_stored),
            thumbnail_alt: self.thumbnail_alt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(format: &str) -> GameDetailEntity {
        GameDetailEntity {
            invite_id: 10,
            title: "Evening Doubles".to_string(),
            description: "Fun match".to_string(),
            status: 1,
            creator: 7,
            format: format.to_string(),
            capacity: 4,
            currently_enrolled: 1,
            is_active: true,
            reservation_id: 3,
            court_number: 1,
            address: "123 Main St".to_string(),
            postal_code: "V1V1V1".to_string(),
            booking_time: Utc::now(),
            thumbnail: None,
            thumbnail_alt: None,
        }
    }

    #[test]
    fn test_into_domain() {
        let record = entity("doubles").into_domain().unwrap();
        assert_eq!(record.format, GameFormat::Doubles);
        assert_eq!(record.status, InvitationStatus::Open);
        assert_eq!(record.court.court_number, 1);
        assert_eq!(record.reservation_id, 3);
    }

    #[test]
    fn test_into_domain_unknown_format() {
        assert!(matches!(
            entity("triples").into_domain(),
            Err(StoreError::Database(_))
        ));
    }
}
