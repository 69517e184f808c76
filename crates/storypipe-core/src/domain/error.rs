//! Domain-level error taxonomy for the pipeline.
//!
//! Every message that can reach an operator embeds the story id, so a
//! failure can be traced back to the feature that caused it. There is no
//! structured error-code registry; the variant is the classification.

use crate::domain::stage::AgentId;

/// Pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage received malformed or incomplete input data. Raised
    /// immediately during payload extraction; never retried.
    #[error("story {story_id}: business logic error: {detail}")]
    BusinessLogic { story_id: String, detail: String },

    /// A scoring/analysis routine itself failed. Distinct from a
    /// compliance *violation*, which is an ordinary boolean result.
    #[error("dna compliance analysis failed: {0}")]
    DnaCompliance(String),

    /// A required quality threshold was not met at a stage that treats
    /// the miss as fatal (test engineer coverage/performance/security).
    #[error("story {story_id}: quality gate '{gate}' not met: {detail}")]
    QualityGate {
        story_id: String,
        gate: String,
        detail: String,
    },

    /// Top-level wrap: any lower-level failure inside one stage's
    /// `process_contract`, raised to the pipeline caller with context.
    #[error("story {story_id}: {stage} stage failed: {source}")]
    AgentExecution {
        story_id: String,
        stage: AgentId,
        #[source]
        source: Box<PipelineError>,
    },

    /// The embedded datastore (the external collaborator) failed.
    #[error("storage error: {0}")]
    Storage(#[from] storypipe_state::StorageError),

    /// Serialization failure at a contract boundary.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wrap an error with the stage and story that produced it.
    ///
    /// Already-wrapped errors pass through unchanged so the outermost
    /// context wins.
    pub fn in_stage(self, story_id: &str, stage: AgentId) -> Self {
        match self {
            err @ PipelineError::AgentExecution { .. } => err,
            other => PipelineError::AgentExecution {
                story_id: story_id.to_string(),
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_embed_story_id() {
        let err = PipelineError::BusinessLogic {
            story_id: "story-42".to_string(),
            detail: "missing feature_description".to_string(),
        };
        assert!(err.to_string().contains("story-42"));

        let err = PipelineError::QualityGate {
            story_id: "story-42".to_string(),
            gate: "test_coverage_adequate".to_string(),
            detail: "coverage 71.0% below minimum 90.0%".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("story-42"));
        assert!(msg.contains("test_coverage_adequate"));
    }

    #[test]
    fn test_in_stage_wraps_once() {
        let inner = PipelineError::DnaCompliance("bad payload".to_string());
        let wrapped = inner.in_stage("story-7", AgentId::ProjectManager);
        let rewrapped = wrapped.in_stage("story-7", AgentId::GameDesigner);

        match rewrapped {
            PipelineError::AgentExecution { stage, .. } => {
                // The original wrap is preserved, not replaced.
                assert_eq!(stage, AgentId::ProjectManager);
            }
            other => panic!("expected AgentExecution, got {other:?}"),
        }
    }
}
