//! Error types for storypipe-state

use thiserror::Error;

/// Errors produced by the pipeline persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Backend query error
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Story not found in the project ledger
    #[error("story not found: {story_id}")]
    StoryNotFound { story_id: String },

    /// Stakeholder not found in the registry
    #[error("stakeholder not found: {stakeholder_id}")]
    StakeholderNotFound { stakeholder_id: String },

    /// Operation not valid for the story's current status
    #[error("story {story_id} is {status}, expected {expected}")]
    InvalidStoryState {
        story_id: String,
        status: String,
        expected: String,
    },

    /// Duplicate story creation
    #[error("story already exists: {story_id}")]
    DuplicateStory { story_id: String },

    /// Serialization failure at the storage boundary
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;
