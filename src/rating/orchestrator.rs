//! Rating update orchestration
//!
//! Entry point for the match-recording flow: validates rosters, loads the
//! current records, runs the configured method and commits every resulting
//! delta as one batch. A batch that loses a version race against a
//! concurrent update is recomputed from fresh records.

use crate::config::ServiceSettings;
use crate::error::{RatingError, Result};
use crate::metrics::RatingMetrics;
use crate::rating::method::RatingMethod;
use crate::rating::storage::RatingStorage;
use crate::types::{
    MatchOutcome, ParticipantId, RatingDelta, RatingRecord, RatingUpdateSummary,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Persistence budget and retry policy
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Budget for each storage call
    pub storage_timeout: Duration,
    /// Attempts per update when commits hit version conflicts
    pub max_commit_attempts: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            storage_timeout: Duration::from_secs(5),
            max_commit_attempts: 3,
        }
    }
}

impl From<&ServiceSettings> for OrchestratorSettings {
    fn from(settings: &ServiceSettings) -> Self {
        Self {
            storage_timeout: settings.commit_timeout(),
            max_commit_attempts: settings.max_commit_attempts.max(1),
        }
    }
}

/// Computes and persists rating updates for recorded matches
pub struct RatingUpdateOrchestrator {
    method: RatingMethod,
    storage: Arc<dyn RatingStorage>,
    settings: OrchestratorSettings,
    metrics: Option<Arc<RatingMetrics>>,
}

impl RatingUpdateOrchestrator {
    pub fn new(
        method: RatingMethod,
        storage: Arc<dyn RatingStorage>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            method,
            storage,
            settings,
            metrics: None,
        }
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<RatingMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn method(&self) -> &RatingMethod {
        &self.method
    }

    /// Rate a recorded match
    pub async fn record_match(&self, outcome: &MatchOutcome) -> Result<RatingUpdateSummary> {
        let (winning, losing, is_draw) = outcome.rosters();
        self.update_ratings(winning, losing, is_draw).await
    }

    /// Update every participant of a match, committing all deltas or none
    ///
    /// On a draw the roster order carries no meaning.
    pub async fn update_ratings(
        &self,
        winning: &[ParticipantId],
        losing: &[ParticipantId],
        is_draw: bool,
    ) -> Result<RatingUpdateSummary> {
        let result = self.run_update(winning, losing, is_draw).await;

        if let Some(metrics) = &self.metrics {
            if let Err(e) = &result {
                metrics.record_failure(e);
            }
        }

        result
    }

    async fn run_update(
        &self,
        winning: &[ParticipantId],
        losing: &[ParticipantId],
        is_draw: bool,
    ) -> Result<RatingUpdateSummary> {
        validate_rosters(winning, losing)?;

        let ids: Vec<ParticipantId> = winning.iter().chain(losing).cloned().collect();
        self.ensure_registered(&ids).await?;
        let (deltas, commit_time) = self
            .with_retries(&ids, |records| {
                let winners = ordered(winning, records)?;
                let losers = ordered(losing, records)?;
                self.method
                    .compute_deltas(&winners, &losers, is_draw)
                    .inspect_err(|e| {
                        if let RatingError::NonConvergence { .. } = e {
                            error!(
                                "Rating computation fault ({}) for winners {:?} vs losers {:?}: {}",
                                self.method.name(),
                                winners,
                                losers,
                                e
                            );
                        }
                    })
            })
            .await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_update(self.method.kind(), is_draw, commit_time);
        }

        info!(
            "Committed {} rating update for {} participants (draw: {})",
            self.method.name(),
            deltas.len(),
            is_draw
        );

        Ok(RatingUpdateSummary {
            method: self.method.kind(),
            is_draw,
            deltas,
        })
    }

    /// Grow the deviation of idle participants (Glicko-2 only)
    pub async fn apply_inactivity(
        &self,
        ids: &[ParticipantId],
        elapsed_periods: f64,
    ) -> Result<Vec<RatingDelta>> {
        let RatingMethod::Glicko2(engine) = &self.method else {
            return Err(RatingError::configuration(format!(
                "Inactivity decay is only defined for glicko2, configured method is {}",
                self.method.name()
            )));
        };

        if ids.is_empty() {
            return Err(RatingError::invalid("No participants given for inactivity"));
        }
        ensure_unique(ids)?;
        if !(elapsed_periods.is_finite() && elapsed_periods >= 0.0) {
            return Err(RatingError::invalid(format!(
                "Elapsed periods must be non-negative, got {}",
                elapsed_periods
            )));
        }
        self.ensure_registered(ids).await?;

        let (deltas, _) = self
            .with_retries(ids, |records| {
                ordered(ids, records)?
                    .into_iter()
                    .map(|record| -> Result<RatingDelta> {
                        let state = engine.apply_inactive_period((&record).into(), elapsed_periods)?;
                        Ok(RatingDelta {
                            participant_id: record.id.clone(),
                            old_value: record.value,
                            new_value: state.rating,
                            deviation: Some(state.deviation),
                            volatility: Some(state.volatility),
                            expected_version: record.version,
                        })
                    })
                    .collect()
            })
            .await?;

        info!(
            "Applied {} inactive period(s) to {} participants",
            elapsed_periods,
            deltas.len()
        );

        Ok(deltas)
    }

    /// Check every id against the participant directory before touching ratings
    async fn ensure_registered(&self, ids: &[ParticipantId]) -> Result<()> {
        let participants = self.bounded(self.storage.get_participants(ids)).await?;
        if let Some(missing) = ids
            .iter()
            .find(|id| !participants.iter().any(|p| &p.id == *id))
        {
            return Err(RatingError::ParticipantNotFound {
                participant_id: missing.clone(),
            });
        }

        debug!(
            "Rating {}",
            participants
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }

    /// Load, compute and commit, starting over when a concurrent commit won
    ///
    /// Returns the committed deltas and the time the successful commit took.
    async fn with_retries<F>(
        &self,
        ids: &[ParticipantId],
        compute: F,
    ) -> Result<(Vec<RatingDelta>, Duration)>
    where
        F: Fn(&HashMap<ParticipantId, RatingRecord>) -> Result<Vec<RatingDelta>>,
    {
        let mut attempt = 1;
        loop {
            let records = self.bounded(self.storage.load_ratings(ids)).await?;
            let deltas = compute(&records)?;

            let started = Instant::now();
            match self.bounded(self.storage.commit_ratings(&deltas)).await {
                Ok(()) => {
                    debug!("Rating batch committed on attempt {}", attempt);
                    return Ok((deltas, started.elapsed()));
                }
                Err(e) if e.is_retryable() => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_conflict();
                    }
                    if attempt >= self.settings.max_commit_attempts {
                        warn!("Giving up after {} conflicting commits: {}", attempt, e);
                        return Err(e);
                    }
                    warn!("Rating commit conflict on attempt {}, retrying: {}", attempt, e);
                    attempt += 1;
                }
                Err(e) => {
                    error!("Rating commit failed, no ratings were changed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// Run a storage call within the configured budget
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.settings.storage_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RatingError::Timeout {
                millis: self.settings.storage_timeout.as_millis() as u64,
            }),
        }
    }
}

/// Reject empty rosters and any participant listed twice
fn validate_rosters(winning: &[ParticipantId], losing: &[ParticipantId]) -> Result<()> {
    if winning.is_empty() || losing.is_empty() {
        return Err(RatingError::invalid(format!(
            "Both rosters must be non-empty (got {} and {} participants)",
            winning.len(),
            losing.len()
        )));
    }

    let all: Vec<ParticipantId> = winning.iter().chain(losing).cloned().collect();
    ensure_unique(&all)
}

fn ensure_unique(ids: &[ParticipantId]) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(RatingError::invalid(format!(
                "Participant {} appears more than once",
                id
            )));
        }
    }
    Ok(())
}

/// Records in roster order; a missing record fails the whole update
fn ordered(
    ids: &[ParticipantId],
    records: &HashMap<ParticipantId, RatingRecord>,
) -> Result<Vec<RatingRecord>> {
    ids.iter()
        .map(|id| {
            records
                .get(id)
                .cloned()
                .ok_or_else(|| RatingError::ParticipantNotFound {
                    participant_id: id.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RatingConfig, RatingMethodKind};
    use crate::rating::storage::InMemoryRatingStorage;
    use crate::types::Participant;

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn setup(kind: RatingMethodKind, names: &[&str]) -> (RatingUpdateOrchestrator, Arc<InMemoryRatingStorage>) {
        let config = RatingConfig {
            method: kind,
            ..RatingConfig::default()
        };
        let method = RatingMethod::from_config(&config).unwrap();
        let storage = Arc::new(InMemoryRatingStorage::new());
        for name in names {
            storage
                .register_participant(
                    Participant {
                        id: name.to_string(),
                        name: name.to_uppercase(),
                    },
                    method.initial_record(name.to_string()),
                )
                .unwrap();
        }

        let orchestrator =
            RatingUpdateOrchestrator::new(method, storage.clone(), OrchestratorSettings::default());
        (orchestrator, storage)
    }

    #[tokio::test]
    async fn test_elo_update_commits_all() {
        let (orchestrator, storage) = setup(RatingMethodKind::Elo, &["a", "b", "c", "d"]);

        let summary = orchestrator
            .update_ratings(&ids(&["a", "b"]), &ids(&["c", "d"]), false)
            .await
            .unwrap();

        assert_eq!(summary.deltas.len(), 4);
        assert_eq!(summary.method, RatingMethodKind::Elo);
        assert_eq!(storage.get_rating("a").unwrap().unwrap().value, 1016.0);
        assert_eq!(storage.get_rating("b").unwrap().unwrap().value, 1016.0);
        assert_eq!(storage.get_rating("c").unwrap().unwrap().value, 984.0);
        assert_eq!(storage.get_rating("d").unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_elo_draw_equal_rosters() {
        let (orchestrator, storage) = setup(RatingMethodKind::Elo, &["a", "b"]);

        let summary = orchestrator
            .update_ratings(&ids(&["a"]), &ids(&["b"]), true)
            .await
            .unwrap();

        assert!(summary.is_draw);
        assert!(summary.deltas.iter().all(|d| d.change() == 0.0));
        assert_eq!(storage.get_rating("a").unwrap().unwrap().value, 1000.0);
    }

    #[tokio::test]
    async fn test_validation_happens_before_reads() {
        let (orchestrator, storage) = setup(RatingMethodKind::Elo, &["a", "b"]);

        let empty = orchestrator.update_ratings(&ids(&["a"]), &[], false).await;
        assert!(matches!(empty, Err(RatingError::InvalidInput { .. })));

        let overlap = orchestrator
            .update_ratings(&ids(&["a"]), &ids(&["a", "b"]), false)
            .await;
        assert!(matches!(overlap, Err(RatingError::InvalidInput { .. })));

        assert_eq!(storage.get_rating("a").unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_unknown_participant_changes_nothing() {
        let (orchestrator, storage) = setup(RatingMethodKind::Glicko2, &["a"]);

        let err = orchestrator
            .update_ratings(&ids(&["a"]), &ids(&["ghost"]), false)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RatingError::ParticipantNotFound {
                participant_id: "ghost".to_string()
            }
        );
        assert_eq!(storage.get_rating("a").unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_glicko2_update_sets_all_fields() {
        let (orchestrator, storage) = setup(RatingMethodKind::Glicko2, &["a", "b"]);

        orchestrator
            .update_ratings(&ids(&["a"]), &ids(&["b"]), false)
            .await
            .unwrap();

        let a = storage.get_rating("a").unwrap().unwrap();
        let b = storage.get_rating("b").unwrap().unwrap();
        assert!(a.value > 1500.0);
        assert!(b.value < 1500.0);
        assert!(a.deviation < 350.0);
        assert!((a.value - 1500.0 + b.value - 1500.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_inactivity_requires_glicko2() {
        let (orchestrator, _) = setup(RatingMethodKind::Elo, &["a"]);
        let err = orchestrator.apply_inactivity(&ids(&["a"]), 1.0).await.unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[tokio::test]
    async fn test_inactivity_rejects_bad_elapsed_before_reads() {
        // Nothing is registered, so any storage read would report a missing participant
        let (orchestrator, _) = setup(RatingMethodKind::Glicko2, &[]);

        for elapsed in [-1.0, f64::NAN, f64::INFINITY] {
            let err = orchestrator
                .apply_inactivity(&ids(&["ghost"]), elapsed)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "invalid_input");
        }
    }

    #[tokio::test]
    async fn test_inactivity_unknown_participant() {
        let (orchestrator, _) = setup(RatingMethodKind::Glicko2, &["a"]);
        let err = orchestrator
            .apply_inactivity(&ids(&["a", "ghost"]), 1.0)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RatingError::ParticipantNotFound {
                participant_id: "ghost".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_inactivity_grows_deviation() {
        let (orchestrator, storage) = setup(RatingMethodKind::Glicko2, &["a", "b"]);
        orchestrator
            .update_ratings(&ids(&["a"]), &ids(&["b"]), false)
            .await
            .unwrap();
        let before = storage.get_rating("a").unwrap().unwrap();

        let deltas = orchestrator
            .apply_inactivity(&ids(&["a"]), 3.0)
            .await
            .unwrap();

        let after = storage.get_rating("a").unwrap().unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(after.value, before.value);
        assert!(after.deviation > before.deviation);
        assert_eq!(after.version, 2);
    }
}
