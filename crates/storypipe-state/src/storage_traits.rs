//! Storage trait definitions for StoryPipe
//!
//! These traits define the persistence abstractions the pipeline writes to:
//! - `ProjectLedger`: per-story run history (`project_history` + events)
//! - `StakeholderStore`: stakeholder profiles and interaction history
//! - `MetricsStore`: accuracy metrics keyed by story
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module; SurrealDB implementations live in
//! `surreal_store`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

// ---------------------------------------------------------------------------
// ProjectLedger — per-story pipeline history
// ---------------------------------------------------------------------------

/// Terminal or in-flight status of a story run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Story is still moving through the pipeline.
    InFlight,
    /// Quality reviewer approved; story was routed to deployment.
    Approved,
    /// Quality reviewer rejected; story was routed back for rework.
    Rejected,
    /// A stage failed with an error before the reviewer could decide.
    Failed,
}

impl StoryStatus {
    /// Whether this status is terminal (no more events may be appended).
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InFlight)
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InFlight => "in_flight",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One row of project history: a single story's trip through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Stable story identifier; never changes across stages.
    pub story_id: String,
    /// SHA-256 digest of the originating feature request.
    pub feature_digest: String,
    /// Stakeholder who requested the feature, when known.
    pub stakeholder_id: Option<String>,
    /// Current status.
    pub status: StoryStatus,
    /// Number of reviewer-triggered rework cycles consumed.
    pub rework_cycles: u32,
    /// When the story entered the pipeline.
    pub created_at: DateTime<Utc>,
    /// When the story reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A single progress event within a story run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryEvent {
    /// Monotonic sequence number within the story.
    pub seq: u64,
    /// Event kind (e.g. "stage_started", "handoff_accepted").
    pub kind: String,
    /// Event payload.
    pub payload: serde_json::Value,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Story run ledger.
///
/// Guarantees:
/// - Events are ordered by monotonic `seq` within a story.
/// - A story transitions: InFlight -> Approved | Rejected | Failed (terminal).
/// - Terminal stories are immutable.
#[async_trait]
pub trait ProjectLedger: Send + Sync {
    /// Register a new story run. Fails if the story id already exists.
    async fn create_story(
        &self,
        story_id: &str,
        feature_digest: &str,
        stakeholder_id: Option<String>,
    ) -> StorageResult<()>;

    /// Append an event to an in-flight story. Fails once the story is terminal.
    async fn append_event(&self, story_id: &str, event: StoryEvent) -> StorageResult<()>;

    /// Move a story to a terminal status.
    async fn finish_story(
        &self,
        story_id: &str,
        status: StoryStatus,
        rework_cycles: u32,
    ) -> StorageResult<()>;

    /// Retrieve a story record by id.
    async fn get_story(&self, story_id: &str) -> StorageResult<StoryRecord>;

    /// Retrieve all events for a story, ordered by seq.
    async fn get_events(&self, story_id: &str) -> StorageResult<Vec<StoryEvent>>;

    /// List all story records.
    async fn list_stories(&self) -> StorageResult<Vec<StoryRecord>>;
}

// ---------------------------------------------------------------------------
// StakeholderStore — profiles and interaction history
// ---------------------------------------------------------------------------

/// A stakeholder profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeholderProfile {
    /// Stable stakeholder identifier.
    pub stakeholder_id: String,
    /// Display name used in reports.
    pub display_name: String,
    /// Free-form preference document (communication cadence, priorities).
    pub preferences: serde_json::Value,
    /// Last profile update.
    pub updated_at: DateTime<Utc>,
}

/// One stakeholder interaction (approval request sent, feedback received).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub stakeholder_id: String,
    pub story_id: String,
    /// Interaction kind (e.g. "approval_requested", "feedback_received").
    pub kind: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Stakeholder profile and interaction registry.
#[async_trait]
pub trait StakeholderStore: Send + Sync {
    /// Insert or replace a profile.
    async fn upsert_profile(&self, profile: StakeholderProfile) -> StorageResult<()>;

    /// Fetch a profile, if present.
    async fn get_profile(&self, stakeholder_id: &str) -> StorageResult<Option<StakeholderProfile>>;

    /// Append an interaction to the history.
    async fn record_interaction(&self, interaction: InteractionRecord) -> StorageResult<()>;

    /// All interactions for a stakeholder, oldest first.
    async fn interactions_for(&self, stakeholder_id: &str)
        -> StorageResult<Vec<InteractionRecord>>;
}

// ---------------------------------------------------------------------------
// MetricsStore — accuracy metrics
// ---------------------------------------------------------------------------

/// One predicted-vs-actual measurement for a story (e.g. effort estimate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetric {
    pub story_id: String,
    /// Metric name (e.g. "estimated_effort_hours", "coverage_percent").
    pub metric: String,
    pub predicted: f64,
    pub actual: f64,
    pub recorded_at: DateTime<Utc>,
}

impl AccuracyMetric {
    /// Absolute prediction error.
    pub fn absolute_error(&self) -> f64 {
        (self.predicted - self.actual).abs()
    }
}

/// Accuracy metric history, keyed by story.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Record a measurement.
    async fn record_accuracy(&self, metric: AccuracyMetric) -> StorageResult<()>;

    /// All measurements for a story, oldest first.
    async fn accuracy_history(&self, story_id: &str) -> StorageResult<Vec<AccuracyMetric>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_status_terminal() {
        assert!(!StoryStatus::InFlight.is_terminal());
        assert!(StoryStatus::Approved.is_terminal());
        assert!(StoryStatus::Rejected.is_terminal());
        assert!(StoryStatus::Failed.is_terminal());
    }

    #[test]
    fn test_accuracy_metric_absolute_error() {
        let metric = AccuracyMetric {
            story_id: "story-1".to_string(),
            metric: "estimated_effort_hours".to_string(),
            predicted: 8.0,
            actual: 11.5,
            recorded_at: Utc::now(),
        };
        assert!((metric.absolute_error() - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_story_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&StoryStatus::InFlight).unwrap();
        assert_eq!(json, "\"in_flight\"");
        let back: StoryStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(back, StoryStatus::Approved);
    }
}
