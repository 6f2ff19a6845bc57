//! Rating method configuration

use crate::error::{RatingError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rating method selected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingMethodKind {
    Elo,
    Rms,
    Glicko2,
}

impl RatingMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingMethodKind::Elo => "elo",
            RatingMethodKind::Rms => "rms",
            RatingMethodKind::Glicko2 => "glicko2",
        }
    }
}

impl std::fmt::Display for RatingMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingMethodKind {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "elo" => Ok(RatingMethodKind::Elo),
            "rms" => Ok(RatingMethodKind::Rms),
            "glicko2" | "glicko-2" => Ok(RatingMethodKind::Glicko2),
            other => Err(RatingError::configuration(format!(
                "Unknown rating method '{}' (expected elo, rms or glicko2)",
                other
            ))),
        }
    }
}

/// Constants for the classic Elo update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloSettings {
    pub k_factor: f64,
    pub scale: f64,
    pub initial_rating: f64,
    pub min_rating: f64,
    pub max_rating: f64,
}

impl Default for EloSettings {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            scale: 400.0,
            initial_rating: 1000.0,
            min_rating: 0.0,
            max_rating: 5000.0,
        }
    }
}

/// Constants for the power-mean weighted Elo variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmsSettings {
    pub k_factor: f64,
    pub scale: f64,
    /// Power-mean exponent; larger values pull the team rating toward its strongest member
    pub exponent: f64,
    pub initial_rating: f64,
    pub min_rating: f64,
    pub max_rating: f64,
}

impl Default for RmsSettings {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            scale: 400.0,
            exponent: 15.0,
            initial_rating: 1000.0,
            min_rating: 0.0,
            max_rating: 5000.0,
        }
    }
}

impl RmsSettings {
    /// The pairwise part of RMS is plain Elo with these constants
    pub fn pairwise(&self) -> EloSettings {
        EloSettings {
            k_factor: self.k_factor,
            scale: self.scale,
            initial_rating: self.initial_rating,
            min_rating: self.min_rating,
            max_rating: self.max_rating,
        }
    }
}

/// Constants for Glicko-2, all on the public rating scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Glicko2Settings {
    /// System constant constraining volatility change
    pub tau: f64,
    pub initial_rating: f64,
    pub initial_deviation: f64,
    pub initial_volatility: f64,
    pub min_rating: f64,
    pub max_rating: f64,
    pub min_deviation: f64,
    pub max_deviation: f64,
    pub min_volatility: f64,
    pub max_volatility: f64,
    pub convergence_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for Glicko2Settings {
    fn default() -> Self {
        Self {
            tau: 0.5,
            initial_rating: 1500.0,
            initial_deviation: 350.0,
            initial_volatility: 0.06,
            min_rating: 100.0,
            max_rating: 4000.0,
            min_deviation: 30.0,
            max_deviation: 350.0,
            min_volatility: 0.01,
            max_volatility: 0.15,
            convergence_tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

/// Rating system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub method: RatingMethodKind,
    pub elo: EloSettings,
    pub rms: RmsSettings,
    pub glicko2: Glicko2Settings,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            method: RatingMethodKind::Elo,
            elo: EloSettings::default(),
            rms: RmsSettings::default(),
            glicko2: Glicko2Settings::default(),
        }
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(RatingError::configuration(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

fn require_range(name: &str, min: f64, max: f64, initial: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(RatingError::configuration(format!(
            "{} bounds are inverted or not finite: [{}, {}]",
            name, min, max
        )));
    }
    if initial < min || initial > max {
        return Err(RatingError::configuration(format!(
            "Initial {} {} is outside [{}, {}]",
            name, initial, min, max
        )));
    }
    Ok(())
}

impl EloSettings {
    pub fn validate(&self) -> Result<()> {
        require_positive("K-factor", self.k_factor)?;
        require_positive("Scale factor", self.scale)?;
        require_range("rating", self.min_rating, self.max_rating, self.initial_rating)
    }
}

impl RmsSettings {
    pub fn validate(&self) -> Result<()> {
        require_positive("Power-mean exponent", self.exponent)?;
        self.pairwise().validate()
    }
}

impl Glicko2Settings {
    pub fn validate(&self) -> Result<()> {
        require_positive("Tau", self.tau)?;
        require_positive("Convergence tolerance", self.convergence_tolerance)?;
        if self.max_iterations == 0 {
            return Err(RatingError::configuration(
                "Max iterations must be greater than 0",
            ));
        }
        if self.min_deviation < 0.0 {
            return Err(RatingError::configuration("Min deviation cannot be negative"));
        }
        require_positive("Min volatility", self.min_volatility)?;
        require_range("rating", self.min_rating, self.max_rating, self.initial_rating)?;
        require_range(
            "deviation",
            self.min_deviation,
            self.max_deviation,
            self.initial_deviation,
        )?;
        require_range(
            "volatility",
            self.min_volatility,
            self.max_volatility,
            self.initial_volatility,
        )
    }
}

impl RatingConfig {
    /// Validate every method's settings, not only the selected one
    pub fn validate(&self) -> Result<()> {
        self.elo.validate()?;
        self.rms.validate()?;
        self.glicko2.validate()
    }
}
