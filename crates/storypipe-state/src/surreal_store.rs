//! SurrealDB-backed implementations of the storage traits
//!
//! One connection handle implements all three traits; rows are converted
//! to/from `storage_traits` types at the boundary via the `schema` module.

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::migrations;
use crate::schema::{InteractionRow, MetricRow, StakeholderRow, StoryEventRow, StoryRow};
use crate::storage_traits::{
    AccuracyMetric, InteractionRecord, MetricsStore, ProjectLedger, StakeholderProfile,
    StakeholderStore, StoryEvent, StoryRecord, StoryStatus,
};

/// SurrealDB-backed store implementing [`ProjectLedger`],
/// [`StakeholderStore`] and [`MetricsStore`].
pub struct SurrealStore {
    db: Surreal<Any>,
}

impl SurrealStore {
    /// Create an in-memory instance (`mem://`) — used by tests and the CLI
    /// default.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect("mem://").await
    }

    /// Connect to the given endpoint and initialize the schema.
    ///
    /// Accepts any SurrealDB endpoint (`mem://`, `surrealkv://path`,
    /// `ws://host`).
    pub async fn connect(endpoint: &str) -> StorageResult<Self> {
        let db = surrealdb::engine::any::connect(endpoint)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        db.use_ns("storypipe")
            .use_db("main")
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        info!(endpoint, "SurrealStore connected");
        Ok(Self { db })
    }

    /// Connect from the environment.
    ///
    /// Uses `STORYPIPE_DB_URL` when set; otherwise falls back to local
    /// persistence under `.storypipe/db`.
    pub async fn from_env() -> StorageResult<Self> {
        if let Ok(url) = std::env::var("STORYPIPE_DB_URL") {
            return Self::connect(&url).await;
        }

        let path = ".storypipe/db";
        std::fs::create_dir_all(path).map_err(|e| {
            StorageError::Connection(format!("failed to create database directory {path}: {e}"))
        })?;
        let url = format!("surrealkv://{path}");
        info!("STORYPIPE_DB_URL not set, using local persistence: {url}");
        Self::connect(&url).await
    }

    // -- private helpers -----------------------------------------------------

    /// Fetch a story row, returning StoryNotFound when absent.
    async fn fetch_story(&self, story_id: &str) -> StorageResult<StoryRow> {
        let sid = story_id.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM project_history WHERE story_id = $sid")
            .bind(("sid", sid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<StoryRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::StoryNotFound {
                story_id: story_id.to_string(),
            })
    }

    /// Fetch a story row and verify it is still in flight.
    async fn fetch_in_flight(&self, story_id: &str) -> StorageResult<StoryRow> {
        let row = self.fetch_story(story_id).await?;
        if row.status != "in_flight" {
            return Err(StorageError::InvalidStoryState {
                story_id: story_id.to_string(),
                status: row.status,
                expected: "in_flight".to_string(),
            });
        }
        Ok(row)
    }

    fn row_to_record(row: StoryRow) -> StorageResult<StoryRecord> {
        let status = match row.status.as_str() {
            "in_flight" => StoryStatus::InFlight,
            "approved" => StoryStatus::Approved,
            "rejected" => StoryStatus::Rejected,
            "failed" => StoryStatus::Failed,
            other => {
                return Err(StorageError::Backend(format!(
                    "unknown story status: {other}"
                )))
            }
        };

        Ok(StoryRecord {
            story_id: row.story_id,
            feature_digest: row.feature_digest,
            stakeholder_id: row.stakeholder_id,
            status,
            rework_cycles: row.rework_cycles,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[async_trait]
impl ProjectLedger for SurrealStore {
    async fn create_story(
        &self,
        story_id: &str,
        feature_digest: &str,
        stakeholder_id: Option<String>,
    ) -> StorageResult<()> {
        if self.fetch_story(story_id).await.is_ok() {
            return Err(StorageError::DuplicateStory {
                story_id: story_id.to_string(),
            });
        }

        let row = StoryRow::new(
            story_id.to_string(),
            feature_digest.to_string(),
            stakeholder_id,
        );

        debug!(story_id, "creating story run");

        let _created: Option<StoryRow> = self
            .db
            .create("project_history")
            .content(row)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn append_event(&self, story_id: &str, event: StoryEvent) -> StorageResult<()> {
        self.fetch_in_flight(story_id).await?;

        let row = StoryEventRow::new(story_id.to_string(), event.seq, event.kind, event.payload);

        let _created: Option<StoryEventRow> = self
            .db
            .create("story_events")
            .content(row)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn finish_story(
        &self,
        story_id: &str,
        status: StoryStatus,
        rework_cycles: u32,
    ) -> StorageResult<()> {
        let row = self.fetch_in_flight(story_id).await?;
        let updated = row.finished(&status.to_string(), rework_cycles);
        let sid = story_id.to_string();

        self.db
            .query("UPDATE project_history CONTENT $row WHERE story_id = $sid")
            .bind(("row", updated))
            .bind(("sid", sid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn get_story(&self, story_id: &str) -> StorageResult<StoryRecord> {
        let row = self.fetch_story(story_id).await?;
        Self::row_to_record(row)
    }

    async fn get_events(&self, story_id: &str) -> StorageResult<Vec<StoryEvent>> {
        // Verify the story exists before reading its events.
        self.fetch_story(story_id).await?;

        let sid = story_id.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM story_events WHERE story_id = $sid ORDER BY seq ASC")
            .bind(("sid", sid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<StoryEventRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| StoryEvent {
                seq: r.seq,
                kind: r.kind,
                payload: r.payload,
                timestamp: r.timestamp,
            })
            .collect())
    }

    async fn list_stories(&self) -> StorageResult<Vec<StoryRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM project_history ORDER BY created_at DESC")
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<StoryRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}

#[async_trait]
impl StakeholderStore for SurrealStore {
    async fn upsert_profile(&self, profile: StakeholderProfile) -> StorageResult<()> {
        let row = StakeholderRow {
            stakeholder_id: profile.stakeholder_id.clone(),
            display_name: profile.display_name,
            preferences: profile.preferences,
            updated_at: profile.updated_at,
        };
        let sid = profile.stakeholder_id;

        self.db
            .query("DELETE stakeholder_profiles WHERE stakeholder_id = $sid")
            .bind(("sid", sid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let _created: Option<StakeholderRow> = self
            .db
            .create("stakeholder_profiles")
            .content(row)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn get_profile(
        &self,
        stakeholder_id: &str,
    ) -> StorageResult<Option<StakeholderProfile>> {
        let sid = stakeholder_id.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM stakeholder_profiles WHERE stakeholder_id = $sid")
            .bind(("sid", sid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<StakeholderRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(rows.into_iter().next().map(|r| StakeholderProfile {
            stakeholder_id: r.stakeholder_id,
            display_name: r.display_name,
            preferences: r.preferences,
            updated_at: r.updated_at,
        }))
    }

    async fn record_interaction(&self, interaction: InteractionRecord) -> StorageResult<()> {
        let row = InteractionRow {
            stakeholder_id: interaction.stakeholder_id,
            story_id: interaction.story_id,
            kind: interaction.kind,
            notes: interaction.notes,
            occurred_at: interaction.occurred_at,
        };

        let _created: Option<InteractionRow> = self
            .db
            .create("interaction_history")
            .content(row)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn interactions_for(
        &self,
        stakeholder_id: &str,
    ) -> StorageResult<Vec<InteractionRecord>> {
        let sid = stakeholder_id.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM interaction_history WHERE stakeholder_id = $sid ORDER BY occurred_at ASC")
            .bind(("sid", sid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<InteractionRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| InteractionRecord {
                stakeholder_id: r.stakeholder_id,
                story_id: r.story_id,
                kind: r.kind,
                notes: r.notes,
                occurred_at: r.occurred_at,
            })
            .collect())
    }
}

#[async_trait]
impl MetricsStore for SurrealStore {
    async fn record_accuracy(&self, metric: AccuracyMetric) -> StorageResult<()> {
        let row = MetricRow {
            story_id: metric.story_id,
            metric: metric.metric,
            predicted: metric.predicted,
            actual: metric.actual,
            recorded_at: metric.recorded_at,
        };

        let _created: Option<MetricRow> = self
            .db
            .create("accuracy_metrics")
            .content(row)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn accuracy_history(&self, story_id: &str) -> StorageResult<Vec<AccuracyMetric>> {
        let sid = story_id.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM accuracy_metrics WHERE story_id = $sid ORDER BY recorded_at ASC")
            .bind(("sid", sid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<MetricRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| AccuracyMetric {
                story_id: r.story_id,
                metric: r.metric,
                predicted: r.predicted,
                actual: r.actual,
                recorded_at: r.recorded_at,
            })
            .collect())
    }
}
