//! Domain services: storage seams, game components and workflows.

pub mod asset_store;
pub mod capacity_record;
pub mod error;
pub mod game_workflow;
pub mod invitation_registry;
pub mod memory_store;
pub mod reservation_ledger;
pub mod store;

pub use asset_store::{AssetError, AssetStore, InMemoryAssetStore};
pub use capacity_record::CapacityRecord;
pub use error::GameError;
pub use game_workflow::{CreatedGame, DeletedGame, GameWorkflow};
pub use invitation_registry::{InvitationRegistry, ThumbnailRef};
pub use memory_store::{FailPoint, InMemoryGameStore};
pub use reservation_ledger::ReservationLedger;
pub use store::{GameRecord, GameSession, GameStore, StoreError};
