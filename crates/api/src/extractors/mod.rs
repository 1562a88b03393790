//! Custom Axum extractors.

pub mod game_form;

pub use game_form::CreateGameMultipart;
