//! Game domain models: invitations, reservations and capacity records.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationErrors};

use super::asset::AssetUpload;
use crate::services::error::GameError;

pub type InvitationId = i64;
pub type ReservationId = i64;
pub type CommentId = i64;
pub type UserId = i64;

/// Format of a game. Each format is stored in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameFormat {
    Singles,
    Doubles,
}

impl GameFormat {
    pub const ALL: [GameFormat; 2] = [GameFormat::Singles, GameFormat::Doubles];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameFormat::Singles => "singles",
            GameFormat::Doubles => "doubles",
        }
    }
}

impl fmt::Display for GameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singles" => Ok(GameFormat::Singles),
            "doubles" => Ok(GameFormat::Doubles),
            other => Err(format!("Unknown game type: {}", other)),
        }
    }
}

/// Invitation status. Only open invitations can be joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Open,
    Closed,
}

impl InvitationStatus {
    pub fn from_code(code: i16) -> Self {
        if code == 0 {
            InvitationStatus::Closed
        } else {
            InvitationStatus::Open
        }
    }
}

/// Composite court identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtId {
    pub court_number: i32,
    pub address: String,
    pub postal_code: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

/// Accepts `4` as well as `"4"`; form clients send numbers as strings.
fn flexible_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn flexible_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = flexible_i64(deserializer)?;
    i32::try_from(value).map_err(serde::de::Error::custom)
}

/// `location` part of a create-game request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    #[validate(length(max = 255, message = "address must be at most 255 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub address: String,

    #[validate(custom(function = "shared::validation::validate_postal_code"))]
    pub postal_code: String,

    #[serde(deserialize_with = "flexible_i32")]
    #[validate(range(min = 1, message = "courtNumber must be positive"))]
    pub court_number: i32,
}

/// `reservation` part of a create-game request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReservationInput {
    #[validate(custom(function = "shared::validation::validate_booking_time"))]
    pub date_time: String,
}

/// `game` part of a create-game request.
///
/// Capacity is range-checked separately so a low capacity gets its own error.
#[derive(Debug, Clone, Deserialize)]
pub struct GameInput {
    #[serde(deserialize_with = "flexible_i32")]
    pub capacity: i32,

    #[serde(rename = "type")]
    pub format: GameFormat,
}

/// `gameInvite` part of a create-game request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GameInviteInput {
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: String,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    #[serde(default)]
    pub description: String,
}

/// Typed create-game request, assembled from the serialized form fields.
#[derive(Debug, Clone)]
pub struct CreateGameForm {
    pub location: LocationInput,
    pub reservation: ReservationInput,
    pub game: GameInput,
    pub game_invite: GameInviteInput,
    pub user_id: UserId,
}

/// Parses one serialized JSON form field into its typed shape.
pub fn parse_json_field<T: DeserializeOwned>(name: &str, raw: Option<&str>) -> Result<T, GameError> {
    let raw = raw.ok_or_else(|| GameError::Validation(format!("{} is required", name)))?;
    serde_json::from_str(raw).map_err(|e| GameError::Validation(format!("{}: {}", name, e)))
}

/// Flattens validator errors into `field: message` pairs.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

impl CreateGameForm {
    /// Builds the form from the raw multipart text fields.
    pub fn from_fields(
        location: Option<&str>,
        reservation: Option<&str>,
        game: Option<&str>,
        game_invite: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Self, GameError> {
        let user_id = user_id
            .ok_or_else(|| GameError::Validation("userID is required".to_string()))?
            .trim()
            .parse::<UserId>()
            .map_err(|_| GameError::Validation("userID must be an integer".to_string()))?;

        Ok(Self {
            location: parse_json_field("location", location)?,
            reservation: parse_json_field("reservation", reservation)?,
            game: parse_json_field("game", game)?,
            game_invite: parse_json_field("gameInvite", game_invite)?,
            user_id,
        })
    }

    /// Validates every part and produces the workflow command.
    pub fn into_command(self, thumbnail: Option<AssetUpload>) -> Result<CreateGameCommand, GameError> {
        let problems: Vec<String> = [
            self.location.validate(),
            self.reservation.validate(),
            self.game_invite.validate(),
        ]
        .iter()
        .filter_map(|result| result.as_ref().err().map(validation_message))
        .collect();
        if !problems.is_empty() {
            return Err(GameError::Validation(problems.join(", ")));
        }

        if self.game.capacity < 1 {
            return Err(GameError::CapacityTooLow);
        }
        if self.user_id < 1 {
            return Err(GameError::Validation("userID must be positive".to_string()));
        }

        let booking_time = shared::validation::parse_booking_time(&self.reservation.date_time)
            .map_err(|_| {
                GameError::Validation("Booking time must be formatted as YYYY-MM-DD HH:MM".into())
            })?;

        Ok(CreateGameCommand {
            court: CourtId {
                court_number: self.location.court_number,
                address: self.location.address.trim().to_string(),
                postal_code: shared::validation::normalize_postal_code(
                    &self.location.postal_code,
                ),
            },
            booking_time,
            capacity: self.game.capacity,
            format: self.game.format,
            title: self.game_invite.title.trim().to_string(),
            description: self.game_invite.description,
            creator: self.user_id,
            thumbnail,
        })
    }
}

/// Everything the creation workflow needs, already validated.
#[derive(Debug, Clone)]
pub struct CreateGameCommand {
    pub court: CourtId,
    pub booking_time: DateTime<Utc>,
    pub capacity: i32,
    pub format: GameFormat,
    pub title: String,
    pub description: String,
    pub creator: UserId,
    pub thumbnail: Option<AssetUpload>,
}

/// Request body for joining a game.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinGameRequest {
    #[serde(rename = "userID", deserialize_with = "flexible_i64")]
    pub user_id: UserId,
}

/// Success envelope returned by the game endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_id: Option<InvitationId>,
}

impl GameResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            invite_id: None,
        }
    }

    pub fn created(invite_id: InvitationId) -> Self {
        Self {
            success: true,
            invite_id: Some(invite_id),
        }
    }
}

/// Full view of a game for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDetail {
    pub invite_id: InvitationId,
    pub title: String,
    pub description: String,
    pub status: InvitationStatus,
    pub creator: UserId,
    pub format: GameFormat,
    pub capacity: i32,
    pub currently_enrolled: i32,
    pub is_active: bool,
    pub booking_time: DateTime<Utc>,
    pub court: CourtId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_alt: Option<String>,
}
