//! Domain models for Pickuple.

pub mod asset;
pub mod game;

pub use asset::{AssetContent, AssetKey, AssetUpload};
pub use game::{
    CommentId, CourtId, CreateGameCommand, CreateGameForm, GameDetail, GameFormat,
    InvitationId, InvitationStatus, ReservationId, UserId,
};
