//! Rating storage interface and implementations
//!
//! The orchestrator only needs three things from persistence: participant
//! lookup, a batch read of rating records, and an atomic batch commit that
//! either applies every delta or none of them.

use crate::error::{RatingError, Result};
use crate::types::{Participant, ParticipantId, RatingDelta, RatingRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Trait for rating persistence
#[async_trait]
pub trait RatingStorage: Send + Sync {
    /// Look up directory entries; unknown ids are skipped
    async fn get_participants(&self, ids: &[ParticipantId]) -> Result<Vec<Participant>>;

    /// Load the current rating records; unknown ids are skipped
    async fn load_ratings(
        &self,
        ids: &[ParticipantId],
    ) -> Result<HashMap<ParticipantId, RatingRecord>>;

    /// Apply every delta or none
    ///
    /// Each delta's `expected_version` must match the stored record, otherwise
    /// the whole batch is rejected with [`RatingError::VersionConflict`].
    async fn commit_ratings(&self, deltas: &[RatingDelta]) -> Result<()>;
}

#[derive(Debug, Default)]
struct StorageState {
    participants: HashMap<ParticipantId, Participant>,
    ratings: HashMap<ParticipantId, RatingRecord>,
}

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStorage {
    state: RwLock<StorageState>,
}

impl InMemoryRatingStorage {
    /// Create an empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage from existing records, registering a participant per record
    pub fn from_records(records: impl IntoIterator<Item = RatingRecord>) -> Self {
        let mut state = StorageState::default();
        for record in records {
            state.participants.insert(
                record.id.clone(),
                Participant {
                    id: record.id.clone(),
                    name: record.id.clone(),
                },
            );
            state.ratings.insert(record.id.clone(), record);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StorageState>> {
        self.state.read().map_err(|_| RatingError::Persistence {
            message: "Failed to acquire ratings read lock".to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StorageState>> {
        self.state.write().map_err(|_| RatingError::Persistence {
            message: "Failed to acquire ratings write lock".to_string(),
        })
    }

    /// Register a participant with its seed rating
    ///
    /// Records are created exactly once; registering an existing id fails.
    pub fn register_participant(&self, participant: Participant, seed: RatingRecord) -> Result<()> {
        if participant.id != seed.id {
            return Err(RatingError::invalid(format!(
                "Seed record {} does not belong to participant {}",
                seed.id, participant.id
            )));
        }

        let mut state = self.write()?;
        if state.ratings.contains_key(&participant.id) {
            return Err(RatingError::invalid(format!(
                "Participant {} is already registered",
                participant.id
            )));
        }

        state.ratings.insert(participant.id.clone(), seed);
        state.participants.insert(participant.id.clone(), participant);
        Ok(())
    }

    /// Get a single participant's rating
    pub fn get_rating(&self, id: &str) -> Result<Option<RatingRecord>> {
        Ok(self.read()?.ratings.get(id).cloned())
    }

    /// All records sorted by id
    pub fn snapshot(&self) -> Result<Vec<RatingRecord>> {
        let mut records: Vec<RatingRecord> = self.read()?.ratings.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// Get total number of rated participants
    pub fn participant_count(&self) -> Result<usize> {
        Ok(self.read()?.ratings.len())
    }
}

#[async_trait]
impl RatingStorage for InMemoryRatingStorage {
    async fn get_participants(&self, ids: &[ParticipantId]) -> Result<Vec<Participant>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.participants.get(id).cloned())
            .collect())
    }

    async fn load_ratings(
        &self,
        ids: &[ParticipantId],
    ) -> Result<HashMap<ParticipantId, RatingRecord>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.ratings.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    async fn commit_ratings(&self, deltas: &[RatingDelta]) -> Result<()> {
        let mut state = self.write()?;

        // Verify the whole batch before touching any record
        for delta in deltas {
            let record = state.ratings.get(&delta.participant_id).ok_or_else(|| {
                RatingError::ParticipantNotFound {
                    participant_id: delta.participant_id.clone(),
                }
            })?;
            if record.version != delta.expected_version {
                return Err(RatingError::VersionConflict {
                    participant_id: delta.participant_id.clone(),
                    expected: delta.expected_version,
                    found: record.version,
                });
            }
        }

        for delta in deltas {
            if let Some(record) = state.ratings.get_mut(&delta.participant_id) {
                record.apply(delta);
            }
        }

        Ok(())
    }
}
