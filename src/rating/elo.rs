//! Classic Elo rating system over team-averaged ratings
//!
//! Both rosters are reduced to one rating, a single pair of whole-point
//! deltas is computed, and every member of a roster receives its side's
//! delta unchanged.

use crate::config::EloSettings;
use crate::error::Result;
use crate::rating::aggregate::average_rating;
use crate::types::{score, ParticipantId, RatingDelta, RatingRecord};

/// Whole-point rating changes for each side of a match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseDeltas {
    /// Applied to every member of the winning (or first drawing) roster
    pub winner: f64,
    /// Applied to every member of the losing (or second drawing) roster
    pub loser: f64,
}

/// Elo rating calculator
#[derive(Debug, Clone)]
pub struct EloEngine {
    settings: EloSettings,
}

impl EloEngine {
    /// Create a new Elo engine
    pub fn new(settings: EloSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &EloSettings {
        &self.settings
    }

    /// Expected score of a side rated `rating` against a side rated `opponent`
    pub fn expected_score(&self, rating: f64, opponent: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf((opponent - rating) / self.settings.scale))
    }

    /// Deltas for a match between aggregate ratings `rw` and `rl`
    ///
    /// On a draw both sides score 0.5 against their own expectation, so equal
    /// aggregates produce no change.
    pub fn team_deltas(&self, rw: f64, rl: f64, is_draw: bool) -> PairwiseDeltas {
        let k = self.settings.k_factor;
        let expected_w = self.expected_score(rw, rl);
        let expected_l = 1.0 - expected_w;

        let (actual_w, actual_l) = if is_draw {
            (score::DRAW, score::DRAW)
        } else {
            (score::WIN, score::LOSS)
        };

        PairwiseDeltas {
            winner: (k * (actual_w - expected_w)).round(),
            loser: (k * (actual_l - expected_l)).round(),
        }
    }

    /// Clamp a rating value into the configured bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.settings.min_rating, self.settings.max_rating)
    }

    /// Seed record for a newly registered participant
    pub fn initial_record(&self, id: ParticipantId) -> RatingRecord {
        RatingRecord::new(id, self.settings.initial_rating, 0.0, 0.0)
    }

    /// Compute one delta per participant from already-aggregated team ratings
    pub(crate) fn fan_out(
        &self,
        winners: &[RatingRecord],
        losers: &[RatingRecord],
        rw: f64,
        rl: f64,
        is_draw: bool,
    ) -> Vec<RatingDelta> {
        let deltas = self.team_deltas(rw, rl, is_draw);

        let side = |records: &[RatingRecord], change: f64| {
            records
                .iter()
                .map(|record| RatingDelta {
                    participant_id: record.id.clone(),
                    old_value: record.value,
                    new_value: self.clamp(record.value + change),
                    deviation: None,
                    volatility: None,
                    expected_version: record.version,
                })
                .collect::<Vec<_>>()
        };

        let mut result = side(winners, deltas.winner);
        result.extend(side(losers, deltas.loser));
        result
    }

    /// Rate a roster-vs-roster match using arithmetic team averages
    pub fn compute_deltas(
        &self,
        winners: &[RatingRecord],
        losers: &[RatingRecord],
        is_draw: bool,
    ) -> Result<Vec<RatingDelta>> {
        let rw = average_rating(&values(winners))?;
        let rl = average_rating(&values(losers))?;
        Ok(self.fan_out(winners, losers, rw, rl, is_draw))
    }
}

pub(crate) fn values(records: &[RatingRecord]) -> Vec<f64> {
    records.iter().map(|record| record.value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> EloEngine {
        EloEngine::new(EloSettings::default()).unwrap()
    }

    fn record(id: &str, value: f64) -> RatingRecord {
        RatingRecord::new(id.to_string(), value, 0.0, 0.0)
    }

    #[test]
    fn test_equal_ratings_win() {
        let deltas = engine().team_deltas(1200.0, 1200.0, false);
        assert_eq!(deltas.winner, 16.0);
        assert_eq!(deltas.loser, -16.0);
    }

    #[test]
    fn test_equal_ratings_draw_is_neutral() {
        let deltas = engine().team_deltas(1000.0, 1000.0, true);
        assert_eq!(deltas.winner, 0.0);
        assert_eq!(deltas.loser, 0.0);
    }

    #[test]
    fn test_draw_moves_toward_opponent() {
        // The weaker side gains from a draw, the stronger side loses
        let deltas = engine().team_deltas(1000.0, 1400.0, true);
        assert!(deltas.winner > 0.0);
        assert!(deltas.loser < 0.0);
        assert_eq!(deltas.winner + deltas.loser, 0.0);
    }

    #[test]
    fn test_upset_is_worth_more() {
        let engine = engine();
        let upset = engine.team_deltas(1000.0, 1400.0, false);
        let expected = engine.team_deltas(1400.0, 1000.0, false);

        assert!(upset.winner > expected.winner);
        // 32 * (1 - 1/11) = 29.09
        assert_eq!(upset.winner, 29.0);
        assert_eq!(expected.winner, 3.0);
    }

    #[test]
    fn test_zero_sum_one_v_one() {
        let engine = engine();
        for (rw, rl) in [(1000.0, 1000.0), (1234.0, 987.0), (800.0, 1900.0)] {
            let deltas = engine.team_deltas(rw, rl, false);
            assert_eq!(deltas.winner + deltas.loser, 0.0);
        }
    }

    #[test]
    fn test_team_fan_out_is_identical() {
        let engine = engine();
        let winners = vec![record("w1", 1100.0), record("w2", 900.0)];
        let losers = vec![record("l1", 1000.0), record("l2", 1000.0)];

        let deltas = engine.compute_deltas(&winners, &losers, false).unwrap();
        assert_eq!(deltas.len(), 4);

        assert_eq!(deltas[0].change(), 16.0);
        assert_eq!(deltas[1].change(), 16.0);
        assert_eq!(deltas[2].change(), -16.0);
        assert_eq!(deltas[3].change(), -16.0);
        assert!(deltas.iter().all(|d| d.deviation.is_none()));
    }

    #[test]
    fn test_clamped_to_bounds() {
        let settings = EloSettings {
            min_rating: 990.0,
            max_rating: 1010.0,
            ..EloSettings::default()
        };
        let engine = EloEngine::new(settings).unwrap();
        let winners = vec![record("w", 1000.0)];
        let losers = vec![record("l", 1000.0)];

        let deltas = engine.compute_deltas(&winners, &losers, false).unwrap();
        assert_eq!(deltas[0].new_value, 1010.0);
        assert_eq!(deltas[1].new_value, 990.0);
    }

    #[test]
    fn test_empty_roster_is_rejected() {
        let winners = vec![record("w", 1000.0)];
        assert!(engine().compute_deltas(&winners, &[], false).is_err());
    }
}
