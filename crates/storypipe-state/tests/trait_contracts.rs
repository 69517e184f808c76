//! Trait-contract tests run against both the in-memory fakes and the
//! SurrealDB store, so every backend honours the same semantics.

use chrono::Utc;
use serde_json::json;

use storypipe_state::{
    AccuracyMetric, InteractionRecord, MemoryMetricsStore, MemoryProjectLedger,
    MemoryStakeholderStore, MetricsStore, ProjectLedger, StakeholderProfile, StakeholderStore,
    StorageError, StoryEvent, StoryStatus, SurrealStore,
};

fn event(seq: u64, kind: &str) -> StoryEvent {
    StoryEvent {
        seq,
        kind: kind.to_string(),
        payload: json!({ "stage": "project_manager" }),
        timestamp: Utc::now(),
    }
}

async fn ledger_contract(ledger: &dyn ProjectLedger) {
    ledger
        .create_story("story-a1", "digest-1", Some("sh-1".to_string()))
        .await
        .unwrap();

    // Duplicate creation is rejected.
    let dup = ledger.create_story("story-a1", "digest-1", None).await;
    assert!(matches!(dup, Err(StorageError::DuplicateStory { .. })));

    // Events are returned ordered by seq even if appended out of order.
    ledger
        .append_event("story-a1", event(2, "stage_completed"))
        .await
        .unwrap();
    ledger
        .append_event("story-a1", event(1, "stage_started"))
        .await
        .unwrap();

    let events = ledger.get_events("story-a1").await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].seq, 1);
    assert_eq!(events[1].seq, 2);

    // Finishing moves to a terminal state and freezes the story.
    ledger
        .finish_story("story-a1", StoryStatus::Approved, 0)
        .await
        .unwrap();

    let record = ledger.get_story("story-a1").await.unwrap();
    assert_eq!(record.status, StoryStatus::Approved);
    assert!(record.completed_at.is_some());

    let frozen = ledger.append_event("story-a1", event(3, "late")).await;
    assert!(matches!(frozen, Err(StorageError::InvalidStoryState { .. })));

    let refinish = ledger
        .finish_story("story-a1", StoryStatus::Rejected, 1)
        .await;
    assert!(matches!(
        refinish,
        Err(StorageError::InvalidStoryState { .. })
    ));

    // Unknown stories surface StoryNotFound.
    let missing = ledger.get_story("story-nope").await;
    assert!(matches!(missing, Err(StorageError::StoryNotFound { .. })));
}

async fn stakeholder_contract(store: &dyn StakeholderStore) {
    assert!(store.get_profile("sh-7").await.unwrap().is_none());

    let profile = StakeholderProfile {
        stakeholder_id: "sh-7".to_string(),
        display_name: "Product Owner".to_string(),
        preferences: json!({ "update_cadence": "per_story" }),
        updated_at: Utc::now(),
    };
    store.upsert_profile(profile.clone()).await.unwrap();

    let fetched = store.get_profile("sh-7").await.unwrap().unwrap();
    assert_eq!(fetched.display_name, "Product Owner");

    // Upsert replaces, not duplicates.
    let renamed = StakeholderProfile {
        display_name: "PO".to_string(),
        ..profile
    };
    store.upsert_profile(renamed).await.unwrap();
    let fetched = store.get_profile("sh-7").await.unwrap().unwrap();
    assert_eq!(fetched.display_name, "PO");

    store
        .record_interaction(InteractionRecord {
            stakeholder_id: "sh-7".to_string(),
            story_id: "story-a1".to_string(),
            kind: "approval_requested".to_string(),
            notes: None,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap();

    let interactions = store.interactions_for("sh-7").await.unwrap();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].kind, "approval_requested");

    assert!(store.interactions_for("sh-other").await.unwrap().is_empty());
}

async fn metrics_contract(store: &dyn MetricsStore) {
    store
        .record_accuracy(AccuracyMetric {
            story_id: "story-a1".to_string(),
            metric: "estimated_effort_hours".to_string(),
            predicted: 6.0,
            actual: 8.0,
            recorded_at: Utc::now(),
        })
        .await
        .unwrap();

    let history = store.accuracy_history("story-a1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert!((history[0].absolute_error() - 2.0).abs() < f64::EPSILON);

    assert!(store.accuracy_history("story-x").await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_backends_honour_trait_contracts() {
    ledger_contract(&MemoryProjectLedger::new()).await;
    stakeholder_contract(&MemoryStakeholderStore::new()).await;
    metrics_contract(&MemoryMetricsStore::new()).await;
}

#[tokio::test]
async fn surreal_backend_honours_trait_contracts() {
    let store = SurrealStore::in_memory().await.unwrap();
    ledger_contract(&store).await;
    stakeholder_contract(&store).await;
    metrics_contract(&store).await;
}

#[tokio::test]
async fn surrealkv_backend_honours_ledger_contract() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = format!("surrealkv://{}", dir.path().join("db").display());

    let store = SurrealStore::connect(&endpoint).await.unwrap();
    ledger_contract(&store).await;

    let record = store.get_story("story-a1").await.unwrap();
    assert_eq!(record.status, StoryStatus::Approved);
    assert_eq!(record.feature_digest, "digest-1");
}
