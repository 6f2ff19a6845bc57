//! Error types for the rating engine
//!
//! Engines and the orchestrator return [`RatingError`] so callers can tell
//! validation failures, numerical faults and persistence failures apart.
//! Configuration loading and the binary use anyhow on top of these.

/// Result type alias for convenience
pub type Result<T, E = RatingError> = std::result::Result<T, E>;

/// Custom error types for rating computation and persistence
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid rating input: {reason}")]
    InvalidInput { reason: String },

    #[error("Participant not found: {participant_id}")]
    ParticipantNotFound { participant_id: String },

    #[error("Volatility solver did not converge after {iterations} iterations ({stage})")]
    NonConvergence { iterations: usize, stage: String },

    #[error(
        "Rating for {participant_id} was modified concurrently (expected version {expected}, found {found})"
    )]
    VersionConflict {
        participant_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Rating persistence failed: {message}")]
    Persistence { message: String },

    #[error("Rating commit timed out after {millis}ms")]
    Timeout { millis: u64 },
}

impl RatingError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the whole load/compute/commit step may be attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Short stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::InvalidInput { .. } => "invalid_input",
            Self::ParticipantNotFound { .. } => "participant_not_found",
            Self::NonConvergence { .. } => "non_convergence",
            Self::VersionConflict { .. } => "version_conflict",
            Self::Persistence { .. } => "persistence",
            Self::Timeout { .. } => "timeout",
        }
    }
}
