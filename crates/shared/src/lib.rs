//! Shared utilities and common types for the Pickuple backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Asset key generation and signed URL helpers
//! - Common validation logic for game requests

pub mod crypto;
pub mod validation;
