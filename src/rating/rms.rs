//! Power-mean weighted Elo
//!
//! Same pairwise rule as [`EloEngine`], but rosters are reduced with a
//! high-exponent power mean so the strongest member dominates the team
//! rating.

use crate::config::RmsSettings;
use crate::error::Result;
use crate::rating::aggregate::power_mean_rating;
use crate::rating::elo::{values, EloEngine, PairwiseDeltas};
use crate::types::{ParticipantId, RatingDelta, RatingRecord};

/// RMS rating calculator
#[derive(Debug, Clone)]
pub struct RmsEngine {
    exponent: f64,
    pairwise: EloEngine,
}

impl RmsEngine {
    pub fn new(settings: RmsSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            exponent: settings.exponent,
            pairwise: EloEngine::new(settings.pairwise())?,
        })
    }

    /// Team rating under this method
    pub fn team_rating(&self, records: &[RatingRecord]) -> Result<f64> {
        power_mean_rating(&values(records), self.exponent)
    }

    pub fn team_deltas(&self, rw: f64, rl: f64, is_draw: bool) -> PairwiseDeltas {
        self.pairwise.team_deltas(rw, rl, is_draw)
    }

    pub fn initial_record(&self, id: ParticipantId) -> RatingRecord {
        self.pairwise.initial_record(id)
    }

    pub fn compute_deltas(
        &self,
        winners: &[RatingRecord],
        losers: &[RatingRecord],
        is_draw: bool,
    ) -> Result<Vec<RatingDelta>> {
        let rw = self.team_rating(winners)?;
        let rl = self.team_rating(losers)?;
        Ok(self.pairwise.fan_out(winners, losers, rw, rl, is_draw))
    }
}
