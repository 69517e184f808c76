//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryProjectLedger`, `MemoryStakeholderStore`, and
//! `MemoryMetricsStore` that satisfy the trait contracts without any
//! external dependencies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{StorageError, StorageResult};
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryProjectLedger
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct StoryState {
    record: StoryRecord,
    events: Vec<StoryEvent>,
}

/// In-memory project ledger backed by a `HashMap<story_id, StoryState>`.
#[derive(Debug, Default)]
pub struct MemoryProjectLedger {
    stories: Mutex<HashMap<String, StoryState>>,
}

impl MemoryProjectLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectLedger for MemoryProjectLedger {
    async fn create_story(
        &self,
        story_id: &str,
        feature_digest: &str,
        stakeholder_id: Option<String>,
    ) -> StorageResult<()> {
        let mut stories = self.stories.lock().unwrap();
        if stories.contains_key(story_id) {
            return Err(StorageError::DuplicateStory {
                story_id: story_id.to_string(),
            });
        }
        let record = StoryRecord {
            story_id: story_id.to_string(),
            feature_digest: feature_digest.to_string(),
            stakeholder_id,
            status: StoryStatus::InFlight,
            rework_cycles: 0,
            created_at: Utc::now(),
            completed_at: None,
        };
        stories.insert(
            story_id.to_string(),
            StoryState {
                record,
                events: Vec::new(),
            },
        );
        Ok(())
    }

    async fn append_event(&self, story_id: &str, event: StoryEvent) -> StorageResult<()> {
        let mut stories = self.stories.lock().unwrap();
        let state = stories
            .get_mut(story_id)
            .ok_or_else(|| StorageError::StoryNotFound {
                story_id: story_id.to_string(),
            })?;
        if state.record.status.is_terminal() {
            return Err(StorageError::InvalidStoryState {
                story_id: story_id.to_string(),
                status: state.record.status.to_string(),
                expected: "in_flight".to_string(),
            });
        }
        state.events.push(event);
        Ok(())
    }

    async fn finish_story(
        &self,
        story_id: &str,
        status: StoryStatus,
        rework_cycles: u32,
    ) -> StorageResult<()> {
        let mut stories = self.stories.lock().unwrap();
        let state = stories
            .get_mut(story_id)
            .ok_or_else(|| StorageError::StoryNotFound {
                story_id: story_id.to_string(),
            })?;
        if state.record.status.is_terminal() {
            return Err(StorageError::InvalidStoryState {
                story_id: story_id.to_string(),
                status: state.record.status.to_string(),
                expected: "in_flight".to_string(),
            });
        }
        state.record.status = status;
        state.record.rework_cycles = rework_cycles;
        state.record.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn get_story(&self, story_id: &str) -> StorageResult<StoryRecord> {
        let stories = self.stories.lock().unwrap();
        stories
            .get(story_id)
            .map(|s| s.record.clone())
            .ok_or_else(|| StorageError::StoryNotFound {
                story_id: story_id.to_string(),
            })
    }

    async fn get_events(&self, story_id: &str) -> StorageResult<Vec<StoryEvent>> {
        let stories = self.stories.lock().unwrap();
        let state = stories
            .get(story_id)
            .ok_or_else(|| StorageError::StoryNotFound {
                story_id: story_id.to_string(),
            })?;
        let mut events = state.events.clone();
        events.sort_by_key(|e| e.seq);
        Ok(events)
    }

    async fn list_stories(&self) -> StorageResult<Vec<StoryRecord>> {
        let stories = self.stories.lock().unwrap();
        Ok(stories.values().map(|s| s.record.clone()).collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryStakeholderStore
// ---------------------------------------------------------------------------

/// In-memory stakeholder registry.
#[derive(Debug, Default)]
pub struct MemoryStakeholderStore {
    profiles: Mutex<HashMap<String, StakeholderProfile>>,
    interactions: Mutex<Vec<InteractionRecord>>,
}

impl MemoryStakeholderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StakeholderStore for MemoryStakeholderStore {
    async fn upsert_profile(&self, profile: StakeholderProfile) -> StorageResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        profiles.insert(profile.stakeholder_id.clone(), profile);
        Ok(())
    }

    async fn get_profile(
        &self,
        stakeholder_id: &str,
    ) -> StorageResult<Option<StakeholderProfile>> {
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.get(stakeholder_id).cloned())
    }

    async fn record_interaction(&self, interaction: InteractionRecord) -> StorageResult<()> {
        let mut interactions = self.interactions.lock().unwrap();
        interactions.push(interaction);
        Ok(())
    }

    async fn interactions_for(
        &self,
        stakeholder_id: &str,
    ) -> StorageResult<Vec<InteractionRecord>> {
        let interactions = self.interactions.lock().unwrap();
        Ok(interactions
            .iter()
            .filter(|i| i.stakeholder_id == stakeholder_id)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryMetricsStore
// ---------------------------------------------------------------------------

/// In-memory accuracy metric history.
#[derive(Debug, Default)]
pub struct MemoryMetricsStore {
    metrics: Mutex<Vec<AccuracyMetric>>,
}

impl MemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsStore for MemoryMetricsStore {
    async fn record_accuracy(&self, metric: AccuracyMetric) -> StorageResult<()> {
        let mut metrics = self.metrics.lock().unwrap();
        metrics.push(metric);
        Ok(())
    }

    async fn accuracy_history(&self, story_id: &str) -> StorageResult<Vec<AccuracyMetric>> {
        let metrics = self.metrics.lock().unwrap();
        Ok(metrics
            .iter()
            .filter(|m| m.story_id == story_id)
            .cloned()
            .collect())
    }
}
