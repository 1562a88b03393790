//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod game;

pub use game::{CapacityRecordEntity, GameDetailEntity, GameInviteEntity};
