//! Main application configuration
//!
//! This module defines the top-level configuration for the rating engine,
//! including environment variable loading, TOML files and validation.

use crate::config::rating::{RatingConfig, RatingMethodKind};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Budget for a single rating commit in milliseconds
    pub commit_timeout_ms: u64,
    /// Attempts for a match update when a concurrent update wins the race
    pub max_commit_attempts: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "rating-engine".to_string(),
            log_level: "info".to_string(),
            commit_timeout_ms: 5000,
            max_commit_attempts: 3,
        }
    }
}

impl ServiceSettings {
    /// Get commit timeout as Duration
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", key, raw)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Some(timeout) = parse_env("COMMIT_TIMEOUT_MS")? {
            self.service.commit_timeout_ms = timeout;
        }
        if let Some(attempts) = parse_env("MAX_COMMIT_ATTEMPTS")? {
            self.service.max_commit_attempts = attempts;
        }

        // Rating settings
        if let Ok(method) = env::var("RATING_METHOD") {
            self.rating.method = method.parse::<RatingMethodKind>()?;
        }
        if let Some(k_factor) = parse_env("ELO_K_FACTOR")? {
            self.rating.elo.k_factor = k_factor;
        }
        if let Some(scale) = parse_env("ELO_SCALE")? {
            self.rating.elo.scale = scale;
        }
        if let Some(exponent) = parse_env("RMS_EXPONENT")? {
            self.rating.rms.exponent = exponent;
        }
        if let Some(tau) = parse_env("GLICKO2_TAU")? {
            self.rating.glicko2.tau = tau;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }
    if config.service.commit_timeout_ms == 0 {
        return Err(anyhow!("Commit timeout must be greater than 0"));
    }
    if config.service.max_commit_attempts == 0 {
        return Err(anyhow!("Max commit attempts must be greater than 0"));
    }

    config.rating.validate()?;

    Ok(())
}
