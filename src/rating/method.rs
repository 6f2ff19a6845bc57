//! Rating method selection
//!
//! Only three update rules exist, so the method is a closed enum built once
//! from configuration rather than an open registry of calculators.

use crate::config::{RatingConfig, RatingMethodKind};
use crate::error::Result;
use crate::rating::elo::EloEngine;
use crate::rating::glicko2::Glicko2Engine;
use crate::rating::rms::RmsEngine;
use crate::types::{ParticipantId, RatingDelta, RatingRecord};

/// The configured rating method and its engine
#[derive(Debug, Clone)]
pub enum RatingMethod {
    Elo(EloEngine),
    Rms(RmsEngine),
    Glicko2(Glicko2Engine),
}

impl RatingMethod {
    /// Build the engine for the configured method
    pub fn from_config(config: &RatingConfig) -> Result<Self> {
        Ok(match config.method {
            RatingMethodKind::Elo => RatingMethod::Elo(EloEngine::new(config.elo.clone())?),
            RatingMethodKind::Rms => RatingMethod::Rms(RmsEngine::new(config.rms.clone())?),
            RatingMethodKind::Glicko2 => {
                RatingMethod::Glicko2(Glicko2Engine::new(config.glicko2.clone())?)
            }
        })
    }

    pub fn kind(&self) -> RatingMethodKind {
        match self {
            RatingMethod::Elo(_) => RatingMethodKind::Elo,
            RatingMethod::Rms(_) => RatingMethodKind::Rms,
            RatingMethod::Glicko2(_) => RatingMethodKind::Glicko2,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Seed record for a newly registered participant
    pub fn initial_record(&self, id: ParticipantId) -> RatingRecord {
        match self {
            RatingMethod::Elo(engine) => engine.initial_record(id),
            RatingMethod::Rms(engine) => engine.initial_record(id),
            RatingMethod::Glicko2(engine) => engine.initial_record(id),
        }
    }

    /// One delta per participant, winners first, in roster order
    pub fn compute_deltas(
        &self,
        winners: &[RatingRecord],
        losers: &[RatingRecord],
        is_draw: bool,
    ) -> Result<Vec<RatingDelta>> {
        match self {
            RatingMethod::Elo(engine) => engine.compute_deltas(winners, losers, is_draw),
            RatingMethod::Rms(engine) => engine.compute_deltas(winners, losers, is_draw),
            RatingMethod::Glicko2(engine) => engine.compute_deltas(winners, losers, is_draw),
        }
    }
}
