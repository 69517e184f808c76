//! StoryPipe state persistence
//!
//! Backend-agnostic storage traits for the pipeline's project history,
//! stakeholder registry, and accuracy metrics, with in-memory fakes for
//! testing and SurrealDB-backed implementations for deployment.

pub mod error;
pub mod fakes;
pub mod migrations;
pub mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StorageError, StorageResult};
pub use fakes::{MemoryMetricsStore, MemoryProjectLedger, MemoryStakeholderStore};
pub use storage_traits::{
    AccuracyMetric, InteractionRecord, MetricsStore, ProjectLedger, StakeholderProfile,
    StakeholderStore, StoryEvent, StoryRecord, StoryStatus,
};
pub use surreal_store::SurrealStore;
