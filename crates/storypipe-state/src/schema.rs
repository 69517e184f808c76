//! SurrealDB row types for StoryPipe tables
//!
//! These structs mirror the persisted shape of each table and convert
//! to/from the `storage_traits` types at the boundary. Status transitions
//! are modelled as consuming helpers so the application layer cannot
//! produce an illegal row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row in the `project_history` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRow {
    pub story_id: String,
    pub feature_digest: String,
    pub stakeholder_id: Option<String>,
    /// "in_flight" | "approved" | "rejected" | "failed"
    pub status: String,
    pub rework_cycles: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StoryRow {
    /// Fresh in-flight row.
    pub fn new(story_id: String, feature_digest: String, stakeholder_id: Option<String>) -> Self {
        Self {
            story_id,
            feature_digest,
            stakeholder_id,
            status: "in_flight".to_string(),
            rework_cycles: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Transition to a terminal status.
    pub fn finished(mut self, status: &str, rework_cycles: u32) -> Self {
        self.status = status.to_string();
        self.rework_cycles = rework_cycles;
        self.completed_at = Some(Utc::now());
        self
    }
}

/// Row in the `story_events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryEventRow {
    pub story_id: String,
    pub seq: u64,
    pub kind: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl StoryEventRow {
    pub fn new(story_id: String, seq: u64, kind: String, payload: serde_json::Value) -> Self {
        Self {
            story_id,
            seq,
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Row in the `stakeholder_profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeholderRow {
    pub stakeholder_id: String,
    pub display_name: String,
    pub preferences: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Row in the `interaction_history` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRow {
    pub stakeholder_id: String,
    pub story_id: String,
    pub kind: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Row in the `accuracy_metrics` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRow {
    pub story_id: String,
    pub metric: String,
    pub predicted: f64,
    pub actual: f64,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_row_starts_in_flight() {
        let row = StoryRow::new("story-1".into(), "abc".into(), None);
        assert_eq!(row.status, "in_flight");
        assert!(row.completed_at.is_none());
        assert_eq!(row.rework_cycles, 0);
    }

    #[test]
    fn test_story_row_finished_sets_completed_at() {
        let row = StoryRow::new("story-1".into(), "abc".into(), None).finished("approved", 1);
        assert_eq!(row.status, "approved");
        assert_eq!(row.rework_cycles, 1);
        assert!(row.completed_at.is_some());
    }
}
