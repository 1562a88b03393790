//! Repository implementations for database operations.
//!
//! Statements that run inside a game transaction take a connection; reads
//! and maintenance queries hold the pool.

pub mod capacity_record;
pub mod comment;
pub mod game;
pub mod game_invite;
pub mod picture;
pub mod registration;
pub mod reservation;

pub use capacity_record::CapacityRecordRepository;
pub use comment::CommentRepository;
pub use game::GameRepository;
pub use game_invite::GameInviteRepository;
pub use picture::PictureRepository;
pub use registration::RegistrationRepository;
pub use reservation::ReservationRepository;
