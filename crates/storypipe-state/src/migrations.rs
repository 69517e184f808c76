//! SurrealDB schema initialization for StoryPipe tables
//!
//! Called once per connection; safe to call repeatedly (idempotent).

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StorageResult;

/// Initialize all StoryPipe tables.
pub async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    info!("initializing StoryPipe SurrealDB schema");

    init_project_history(db).await?;
    init_story_events(db).await?;
    init_stakeholder_tables(db).await?;
    init_accuracy_metrics(db).await?;

    info!("StoryPipe schema initialization complete");
    Ok(())
}

/// `project_history`: one row per story run.
///
/// Constraints:
/// - `story_id` is unique
/// - status transitions (in_flight -> approved | rejected | failed) are
///   enforced in application logic; terminal rows are immutable
async fn init_project_history(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("initializing project_history table");

    let sql = r#"
        DEFINE TABLE project_history
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX idx_story_id ON TABLE project_history COLUMNS story_id UNIQUE;
        DEFINE INDEX idx_status ON TABLE project_history COLUMNS status;
        DEFINE INDEX idx_stakeholder_id ON TABLE project_history COLUMNS stakeholder_id;
        DEFINE INDEX idx_created_at ON TABLE project_history COLUMNS created_at;
    "#;

    db.query(sql).await?;
    Ok(())
}

/// `story_events`: ordered progress events per story.
///
/// `(story_id, seq)` is unique; seq is 1-indexed and monotonically
/// increasing, enforced by the pipeline during append.
async fn init_story_events(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("initializing story_events table");

    let sql = r#"
        DEFINE TABLE story_events
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX idx_story_id_seq ON TABLE story_events COLUMNS story_id, seq UNIQUE;
        DEFINE INDEX idx_story_id ON TABLE story_events COLUMNS story_id;
        DEFINE INDEX idx_kind ON TABLE story_events COLUMNS kind;
    "#;

    db.query(sql).await?;
    Ok(())
}

/// `stakeholder_profiles` + `interaction_history`.
async fn init_stakeholder_tables(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("initializing stakeholder tables");

    let sql = r#"
        DEFINE TABLE stakeholder_profiles
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX idx_stakeholder_id ON TABLE stakeholder_profiles COLUMNS stakeholder_id UNIQUE;

        DEFINE TABLE interaction_history
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX idx_interaction_stakeholder ON TABLE interaction_history COLUMNS stakeholder_id;
        DEFINE INDEX idx_interaction_story ON TABLE interaction_history COLUMNS story_id;
    "#;

    db.query(sql).await?;
    Ok(())
}

/// `accuracy_metrics`: predicted-vs-actual measurements per story.
async fn init_accuracy_metrics(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("initializing accuracy_metrics table");

    let sql = r#"
        DEFINE TABLE accuracy_metrics
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX idx_metric_story ON TABLE accuracy_metrics COLUMNS story_id;
        DEFINE INDEX idx_metric_name ON TABLE accuracy_metrics COLUMNS metric;
    "#;

    db.query(sql).await?;
    Ok(())
}
