//! Domain layer for the Pickuple backend.
//!
//! This crate contains:
//! - Domain models (games, reservations, invitations, assets)
//! - The storage and asset store seams used by the game workflows
//! - The game creation, deletion and enrollment workflows
//! - Domain error types

pub mod models;
pub mod services;
