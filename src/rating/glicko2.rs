//! Glicko-2 rating system
//!
//! Ratings are stored on the public (Glicko-1 compatible) scale and are
//! converted to the internal scale for every computation:
//! `μ = (r - 1500) / 173.7178`, `φ = RD / 173.7178`.
//!
//! A rating period is either inactive (deviation grows with volatility) or
//! active, in which case every game in the period is treated as simultaneous
//! and the new volatility is found with the Illinois variant of regula falsi.

use crate::config::Glicko2Settings;
use crate::error::{RatingError, Result};
use crate::types::{score, GameResult, ParticipantId, RatingDelta, RatingRecord};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Ratio between the public and internal scales (400 / ln 10)
pub const GLICKO2_SCALE: f64 = 173.7178;

/// Public rating that maps to μ = 0
pub const GLICKO2_CENTER: f64 = 1500.0;

/// Rating, deviation and volatility on the public scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glicko2State {
    pub rating: f64,
    pub deviation: f64,
    pub volatility: f64,
}

impl Glicko2State {
    pub fn new(rating: f64, deviation: f64, volatility: f64) -> Self {
        Self {
            rating,
            deviation,
            volatility,
        }
    }

    /// Rating on the internal scale
    pub fn mu(&self) -> f64 {
        (self.rating - GLICKO2_CENTER) / GLICKO2_SCALE
    }

    /// Deviation on the internal scale
    pub fn phi(&self) -> f64 {
        self.deviation / GLICKO2_SCALE
    }

    fn from_internal(mu: f64, phi: f64, volatility: f64) -> Self {
        Self {
            rating: mu * GLICKO2_SCALE + GLICKO2_CENTER,
            deviation: phi * GLICKO2_SCALE,
            volatility,
        }
    }
}

impl From<&RatingRecord> for Glicko2State {
    fn from(record: &RatingRecord) -> Self {
        Self::new(record.value, record.deviation, record.volatility)
    }
}

/// Impact factor g(φ); the Glicko-1 constant q = ln10/400 is folded into the scale
fn g(phi: f64) -> f64 {
    1.0 / (1.0 + 3.0 * phi * phi / (PI * PI)).sqrt()
}

fn expected(mu: f64, mu_j: f64, phi_j: f64) -> f64 {
    1.0 / (1.0 + (-g(phi_j) * (mu - mu_j)).exp())
}

/// Reject subject states the period update is not defined for
fn validate_state(state: &Glicko2State) -> Result<()> {
    if !(state.deviation.is_finite() && state.deviation >= 0.0) {
        return Err(RatingError::invalid(format!(
            "Deviation must be non-negative, got {}",
            state.deviation
        )));
    }
    if !(state.volatility.is_finite() && state.volatility > 0.0) {
        return Err(RatingError::invalid(format!(
            "Volatility must be positive, got {}",
            state.volatility
        )));
    }
    if !state.rating.is_finite() {
        return Err(RatingError::invalid(format!(
            "Rating must be finite, got {}",
            state.rating
        )));
    }
    Ok(())
}

/// Glicko-2 rating calculator
#[derive(Debug, Clone)]
pub struct Glicko2Engine {
    settings: Glicko2Settings,
}

impl Glicko2Engine {
    /// Create a new engine; fails on τ ≤ 0 or inconsistent bounds
    pub fn new(settings: Glicko2Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Glicko2Settings {
        &self.settings
    }

    pub fn initial_record(&self, id: ParticipantId) -> RatingRecord {
        RatingRecord::new(
            id,
            self.settings.initial_rating,
            self.settings.initial_deviation,
            self.settings.initial_volatility,
        )
    }

    /// Clamp all three components into the configured bounds
    pub fn clamp(&self, state: Glicko2State) -> Glicko2State {
        let s = &self.settings;
        Glicko2State {
            rating: state.rating.clamp(s.min_rating, s.max_rating),
            deviation: state.deviation.clamp(s.min_deviation, s.max_deviation),
            volatility: state.volatility.clamp(s.min_volatility, s.max_volatility),
        }
    }

    /// Probability that `player` beats `opponent`
    pub fn expected_score(&self, player: &Glicko2State, opponent: &Glicko2State) -> f64 {
        expected(player.mu(), opponent.mu(), opponent.phi())
    }

    /// Advance a rating through `elapsed_periods` periods without games
    ///
    /// Only the deviation moves: `φ' = sqrt(φ² + σ²·t)`.
    pub fn apply_inactive_period(
        &self,
        state: Glicko2State,
        elapsed_periods: f64,
    ) -> Result<Glicko2State> {
        validate_state(&state)?;
        if !(elapsed_periods.is_finite() && elapsed_periods >= 0.0) {
            return Err(RatingError::invalid(format!(
                "Elapsed periods must be non-negative, got {}",
                elapsed_periods
            )));
        }

        let phi = state.phi();
        let sigma = state.volatility;
        let phi_prime = (phi * phi + sigma * sigma * elapsed_periods).sqrt();

        Ok(self.clamp(Glicko2State {
            deviation: phi_prime * GLICKO2_SCALE,
            ..state
        }))
    }

    /// Advance a rating through one period containing `games`
    ///
    /// An empty period is the same as one inactive period.
    pub fn apply_active_period(
        &self,
        state: Glicko2State,
        games: &[GameResult],
    ) -> Result<Glicko2State> {
        if games.is_empty() {
            return self.apply_inactive_period(state, 1.0);
        }
        validate_state(&state)?;

        for game in games {
            if !(game.opponent_deviation.is_finite() && game.opponent_deviation >= 0.0) {
                return Err(RatingError::invalid(format!(
                    "Opponent deviation must be non-negative, got {}",
                    game.opponent_deviation
                )));
            }
            if !(score::LOSS..=score::WIN).contains(&game.score) {
                return Err(RatingError::invalid(format!(
                    "Game score must be within [0, 1], got {}",
                    game.score
                )));
            }
        }

        let mu = state.mu();
        let phi = state.phi();

        // Estimated variance (as its inverse) and the summed score surprise
        let mut v_inv = 0.0;
        let mut surprise = 0.0;
        for game in games {
            let mu_j = (game.opponent_rating - GLICKO2_CENTER) / GLICKO2_SCALE;
            let phi_j = game.opponent_deviation / GLICKO2_SCALE;
            let g_j = g(phi_j);
            let e_j = expected(mu, mu_j, phi_j);

            v_inv += g_j * g_j * e_j * (1.0 - e_j);
            surprise += g_j * (game.score - e_j);
        }

        if !(v_inv.is_finite() && v_inv > 0.0) {
            return Err(RatingError::NonConvergence {
                iterations: 0,
                stage: format!("degenerate performance variance {}", v_inv),
            });
        }

        let v = 1.0 / v_inv;
        let delta = v * surprise;

        let sigma_prime = self.solve_volatility(delta, phi, v, state.volatility)?;

        let phi_star = (phi * phi + sigma_prime * sigma_prime).sqrt();
        let phi_prime = 1.0 / (1.0 / (phi_star * phi_star) + v_inv).sqrt();
        let mu_prime = mu + phi_prime * phi_prime * surprise;

        Ok(self.clamp(Glicko2State::from_internal(
            mu_prime,
            phi_prime,
            sigma_prime,
        )))
    }

    /// Find σ' as the root of Glickman's f(x) with x = ln σ'²
    fn solve_volatility(&self, delta: f64, phi: f64, v: f64, sigma: f64) -> Result<f64> {
        let tau = self.settings.tau;
        let epsilon = self.settings.convergence_tolerance;
        let max_iterations = self.settings.max_iterations;

        let phi_sq = phi * phi;
        let delta_sq = delta * delta;
        let a = (sigma * sigma).ln();

        let f = |x: f64| {
            let ex = x.exp();
            let denom = phi_sq + v + ex;
            ex * (delta_sq - phi_sq - v - ex) / (2.0 * denom * denom) - (x - a) / (tau * tau)
        };

        // Bracket the root: f(A) and f(B) must have opposite signs
        let mut lower = a;
        let mut upper = if delta_sq > phi_sq + v {
            (delta_sq - phi_sq - v).ln()
        } else {
            let mut k = 1;
            while f(a - k as f64 * tau) < 0.0 {
                k += 1;
                if k > max_iterations {
                    return Err(RatingError::NonConvergence {
                        iterations: max_iterations,
                        stage: "bracket search".to_string(),
                    });
                }
            }
            a - k as f64 * tau
        };

        let mut f_lower = f(lower);
        let mut f_upper = f(upper);

        for _ in 0..max_iterations {
            if (upper - lower).abs() <= epsilon {
                return Ok((upper / 2.0).exp());
            }

            let candidate = lower + (lower - upper) * f_lower / (f_upper - f_lower);
            let f_candidate = f(candidate);

            if f_candidate * f_upper <= 0.0 {
                lower = upper;
                f_lower = f_upper;
            } else {
                // Illinois step: halve the stale endpoint
                f_lower /= 2.0;
            }

            upper = candidate;
            f_upper = f_candidate;
        }

        if (upper - lower).abs() <= epsilon {
            return Ok((upper / 2.0).exp());
        }

        Err(RatingError::NonConvergence {
            iterations: max_iterations,
            stage: "illinois iteration".to_string(),
        })
    }

    /// Rate every participant individually against each member of the other roster
    ///
    /// All updates start from the pre-match records.
    pub fn compute_deltas(
        &self,
        winners: &[RatingRecord],
        losers: &[RatingRecord],
        is_draw: bool,
    ) -> Result<Vec<RatingDelta>> {
        if winners.is_empty() || losers.is_empty() {
            return Err(RatingError::invalid("Both rosters must be non-empty"));
        }

        let (winner_score, loser_score) = if is_draw {
            (score::DRAW, score::DRAW)
        } else {
            (score::WIN, score::LOSS)
        };

        let mut deltas = Vec::with_capacity(winners.len() + losers.len());
        for (side, opponents, side_score) in [
            (winners, losers, winner_score),
            (losers, winners, loser_score),
        ] {
            for record in side {
                let games: Vec<GameResult> = opponents
                    .iter()
                    .map(|opponent| GameResult {
                        opponent_rating: opponent.value,
                        opponent_deviation: opponent.deviation,
                        score: side_score,
                    })
                    .collect();

                let updated = self.apply_active_period(record.into(), &games)?;
                deltas.push(RatingDelta {
                    participant_id: record.id.clone(),
                    old_value: record.value,
                    new_value: updated.rating,
                    deviation: Some(updated.deviation),
                    volatility: Some(updated.volatility),
                    expected_version: record.version,
                });
            }
        }

        Ok(deltas)
    }
}
