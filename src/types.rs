//! Common types used throughout the rating engine

use crate::config::RatingMethodKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for players and users
pub type ParticipantId = String;

/// Directory entry for a rated participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

/// Persisted rating state for one participant
///
/// `deviation` and `volatility` only carry meaning under Glicko-2; Elo and
/// RMS leave them at their seeded values. `version` is bumped by one on
/// every committed update and guards against lost updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub id: ParticipantId,
    pub value: f64,
    pub deviation: f64,
    pub volatility: f64,
    #[serde(default)]
    pub version: u64,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl RatingRecord {
    /// Create a freshly seeded record at version 0
    pub fn new(id: ParticipantId, value: f64, deviation: f64, volatility: f64) -> Self {
        Self {
            id,
            value,
            deviation,
            volatility,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Apply a committed delta, bumping the version
    pub fn apply(&mut self, delta: &RatingDelta) {
        self.value = delta.new_value;
        if let Some(deviation) = delta.deviation {
            self.deviation = deviation;
        }
        if let Some(volatility) = delta.volatility {
            self.volatility = volatility;
        }
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Result of a recorded match between two rosters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResultKind {
    TeamAWins,
    TeamBWins,
    Draw,
}

impl std::fmt::Display for MatchResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResultKind::TeamAWins => write!(f, "TeamAWins"),
            MatchResultKind::TeamBWins => write!(f, "TeamBWins"),
            MatchResultKind::Draw => write!(f, "Draw"),
        }
    }
}

/// A completed match as handed over by the match-recording flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub team_a: Vec<ParticipantId>,
    pub team_b: Vec<ParticipantId>,
    pub result: MatchResultKind,
}

impl MatchOutcome {
    /// Split into `(winning, losing, is_draw)`; on a draw team A comes first
    pub fn rosters(&self) -> (&[ParticipantId], &[ParticipantId], bool) {
        match self.result {
            MatchResultKind::TeamAWins => (self.team_a.as_slice(), self.team_b.as_slice(), false),
            MatchResultKind::TeamBWins => (self.team_b.as_slice(), self.team_a.as_slice(), false),
            MatchResultKind::Draw => (self.team_a.as_slice(), self.team_b.as_slice(), true),
        }
    }
}

/// Actual score of a single game from the subject's point of view
pub mod score {
    pub const WIN: f64 = 1.0;
    pub const DRAW: f64 = 0.5;
    pub const LOSS: f64 = 0.0;
}

/// One game against a known opponent within a Glicko-2 rating period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub opponent_rating: f64,
    pub opponent_deviation: f64,
    pub score: f64,
}

/// New rating state computed for one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingDelta {
    pub participant_id: ParticipantId,
    pub old_value: f64,
    pub new_value: f64,
    pub deviation: Option<f64>,
    pub volatility: Option<f64>,
    /// Version of the record the delta was computed from
    pub expected_version: u64,
}

impl RatingDelta {
    /// Signed change of the rating value
    pub fn change(&self) -> f64 {
        self.new_value - self.old_value
    }
}

/// Everything committed by one successful update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingUpdateSummary {
    pub method: RatingMethodKind,
    pub is_draw: bool,
    pub deltas: Vec<RatingDelta>,
}

impl RatingUpdateSummary {
    pub fn delta_for(&self, participant_id: &str) -> Option<&RatingDelta> {
        self.deltas
            .iter()
            .find(|delta| delta.participant_id == participant_id)
    }
}
