//! Rating computation and persistence orchestration
//!
//! This module provides the three rating methods (Elo, power-mean weighted
//! Elo and Glicko-2), team aggregation, the storage seam and the
//! orchestrator that ties them together for one recorded match.

pub mod aggregate;
pub mod elo;
pub mod glicko2;
pub mod method;
pub mod orchestrator;
pub mod rms;
pub mod storage;

// Re-export commonly used types
pub use aggregate::{average_rating, power_mean_rating};
pub use elo::{EloEngine, PairwiseDeltas};
pub use glicko2::{Glicko2Engine, Glicko2State, GLICKO2_CENTER, GLICKO2_SCALE};
pub use method::RatingMethod;
pub use orchestrator::{OrchestratorSettings, RatingUpdateOrchestrator};
pub use rms::RmsEngine;
pub use storage::{InMemoryRatingStorage, RatingStorage};
