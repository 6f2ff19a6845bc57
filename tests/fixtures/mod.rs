//! Test fixtures and storage doubles for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use rating_engine::config::{RatingConfig, RatingMethodKind};
use rating_engine::error::{RatingError, Result};
use rating_engine::rating::{
    InMemoryRatingStorage, OrchestratorSettings, RatingMethod, RatingStorage,
    RatingUpdateOrchestrator,
};
use rating_engine::types::{Participant, ParticipantId, RatingDelta, RatingRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Build owned participant ids
pub fn ids(names: &[&str]) -> Vec<ParticipantId> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Rating method with default settings
pub fn method(kind: RatingMethodKind) -> RatingMethod {
    RatingMethod::from_config(&RatingConfig {
        method: kind,
        ..RatingConfig::default()
    })
    .unwrap()
}

/// In-memory storage with every participant seeded by `method`
pub fn seeded_storage(method: &RatingMethod, names: &[&str]) -> Arc<InMemoryRatingStorage> {
    let storage = Arc::new(InMemoryRatingStorage::new());
    for name in names {
        storage
            .register_participant(
                Participant {
                    id: name.to_string(),
                    name: format!("Participant {}", name),
                },
                method.initial_record(name.to_string()),
            )
            .unwrap();
    }
    storage
}

/// Orchestrator over `storage` with a short storage budget
pub fn orchestrator(
    kind: RatingMethodKind,
    storage: Arc<dyn RatingStorage>,
    max_commit_attempts: u32,
) -> RatingUpdateOrchestrator {
    RatingUpdateOrchestrator::new(
        method(kind),
        storage,
        OrchestratorSettings {
            storage_timeout: Duration::from_millis(200),
            max_commit_attempts,
        },
    )
}

/// Storage whose commit always fails
#[derive(Debug)]
pub struct FailingCommitStorage {
    pub inner: Arc<InMemoryRatingStorage>,
    pub commit_calls: AtomicUsize,
}

impl FailingCommitStorage {
    pub fn new(inner: Arc<InMemoryRatingStorage>) -> Self {
        Self {
            inner,
            commit_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RatingStorage for FailingCommitStorage {
    async fn get_participants(&self, ids: &[ParticipantId]) -> Result<Vec<Participant>> {
        self.inner.get_participants(ids).await
    }

    async fn load_ratings(
        &self,
        ids: &[ParticipantId],
    ) -> Result<HashMap<ParticipantId, RatingRecord>> {
        self.inner.load_ratings(ids).await
    }

    async fn commit_ratings(&self, _deltas: &[RatingDelta]) -> Result<()> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        Err(RatingError::Persistence {
            message: "simulated transaction abort".to_string(),
        })
    }
}

/// Storage whose commit takes longer than the orchestrator's budget
#[derive(Debug)]
pub struct SlowCommitStorage {
    pub inner: Arc<InMemoryRatingStorage>,
    pub delay: Duration,
}

#[async_trait]
impl RatingStorage for SlowCommitStorage {
    async fn get_participants(&self, ids: &[ParticipantId]) -> Result<Vec<Participant>> {
        self.inner.get_participants(ids).await
    }

    async fn load_ratings(
        &self,
        ids: &[ParticipantId],
    ) -> Result<HashMap<ParticipantId, RatingRecord>> {
        self.inner.load_ratings(ids).await
    }

    async fn commit_ratings(&self, deltas: &[RatingDelta]) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.commit_ratings(deltas).await
    }
}

/// Storage that lets a competing update commit first on the next `conflicts` commits
///
/// The competing update adds `bump` to the first participant of the batch.
#[derive(Debug)]
pub struct RacingStorage {
    pub inner: Arc<InMemoryRatingStorage>,
    pub conflicts: AtomicUsize,
    pub bump: f64,
}

impl RacingStorage {
    pub fn new(inner: Arc<InMemoryRatingStorage>, conflicts: usize, bump: f64) -> Self {
        Self {
            inner,
            conflicts: AtomicUsize::new(conflicts),
            bump,
        }
    }
}

#[async_trait]
impl RatingStorage for RacingStorage {
    async fn get_participants(&self, ids: &[ParticipantId]) -> Result<Vec<Participant>> {
        self.inner.get_participants(ids).await
    }

    async fn load_ratings(
        &self,
        ids: &[ParticipantId],
    ) -> Result<HashMap<ParticipantId, RatingRecord>> {
        self.inner.load_ratings(ids).await
    }

    async fn commit_ratings(&self, deltas: &[RatingDelta]) -> Result<()> {
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            if let Some(first) = deltas.first() {
                if let Some(current) = self.inner.get_rating(&first.participant_id)? {
                    self.inner
                        .commit_ratings(&[RatingDelta {
                            participant_id: current.id.clone(),
                            old_value: current.value,
                            new_value: current.value + self.bump,
                            deviation: None,
                            volatility: None,
                            expected_version: current.version,
                        }])
                        .await?;
                }
            }
        }
        self.inner.commit_ratings(deltas).await
    }
}
