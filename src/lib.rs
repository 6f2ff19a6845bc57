//! Rating Engine - skill rating updates for recorded matches
//!
//! This crate computes new ratings for every participant of a match using
//! Elo, a power-mean weighted Elo variant, or Glicko-2, and persists the
//! whole batch atomically through a pluggable storage.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod types;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use rating::{InMemoryRatingStorage, RatingMethod, RatingStorage, RatingUpdateOrchestrator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
