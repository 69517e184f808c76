//! Typed per-stage payloads.
//!
//! Each stage extracts its expected payload from the incoming contract's
//! `input_requirements.required_data`. On the wire the payload stays an
//! untyped JSON document (the contract shape is fixed); in process it is
//! decoded into one of these structs, so agents never do stringly-keyed
//! dictionary access. Decoding failures surface as business-logic errors
//! at the start of a stage, before any tool runs.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};
use crate::domain::stage::AgentId;

/// Complexity band assigned by the story analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        };
        write!(f, "{s}")
    }
}

/// The feature request that starts a story — the project manager's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRequest {
    /// Explicit story id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    pub feature_description: String,
    /// How long a player session may take. Ten minutes is the ceiling the
    /// DNA checker enforces.
    pub time_constraint_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

/// What the game designer receives from the project manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignBrief {
    pub feature_description: String,
    pub acceptance_criteria: Vec<String>,
    pub complexity: Complexity,
    pub time_constraint_minutes: u32,
}

/// The game design produced by the designer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDesign {
    pub mechanics: Vec<String>,
    pub ui_components: Vec<String>,
    pub interaction_flow: Vec<String>,
}

/// First-pass developer input: the design handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignHandoff {
    pub design: GameDesign,
    pub acceptance_criteria: Vec<String>,
}

/// Rework developer input: the reviewer's rejection routed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReworkOrder {
    pub rework_notes: Vec<String>,
    pub blocking_issues: Vec<String>,
    pub implemented_files: Vec<String>,
    pub test_files: Vec<String>,
    pub acceptance_criteria: Vec<String>,
}

/// The developer accepts either a fresh design or a rework order —
/// the two sources permitted by the handoff graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImplementationOrder {
    Design(DesignHandoff),
    Rework(ReworkOrder),
}

/// What the test engineer receives from the developer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAssignment {
    pub implemented_files: Vec<String>,
    pub test_files: Vec<String>,
    pub api_endpoints: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    /// Free-text notes from the developer; the security scan reads these.
    pub implementation_notes: String,
}

/// What the QA tester receives from the test engineer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAssignment {
    pub coverage_percent: f64,
    pub response_time_ms: u64,
    pub security_findings: Vec<String>,
    pub implemented_files: Vec<String>,
    pub test_files: Vec<String>,
    pub acceptance_criteria: Vec<String>,
}

/// What the quality reviewer receives from QA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDossier {
    pub overall_score: f64,
    pub blocking_issues: Vec<String>,
    pub deployment_ready: bool,
    pub coverage_percent: f64,
    pub response_time_ms: u64,
    pub implemented_files: Vec<String>,
    pub test_files: Vec<String>,
    pub acceptance_criteria: Vec<String>,
}

/// Sum of all stage payloads — one variant per consuming stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StagePayload {
    FeatureRequest(FeatureRequest),
    DesignBrief(DesignBrief),
    ImplementationOrder(ImplementationOrder),
    TestAssignment(TestAssignment),
    QaAssignment(QaAssignment),
    ReviewDossier(ReviewDossier),
}

impl StagePayload {
    /// Decode the payload a given stage expects from `required_data`.
    ///
    /// A missing or malformed document is a business-logic error — the
    /// stage fails fast before any tool runs.
    pub fn decode_for(
        stage: AgentId,
        story_id: &str,
        data: &serde_json::Value,
    ) -> Result<StagePayload> {
        let fail = |e: serde_json::Error| PipelineError::BusinessLogic {
            story_id: story_id.to_string(),
            detail: format!("required_data does not match {stage} payload: {e}"),
        };

        match stage {
            AgentId::ProjectManager => serde_json::from_value(data.clone())
                .map(StagePayload::FeatureRequest)
                .map_err(fail),
            AgentId::GameDesigner => serde_json::from_value(data.clone())
                .map(StagePayload::DesignBrief)
                .map_err(fail),
            AgentId::Developer => serde_json::from_value(data.clone())
                .map(StagePayload::ImplementationOrder)
                .map_err(fail),
            AgentId::TestEngineer => serde_json::from_value(data.clone())
                .map(StagePayload::TestAssignment)
                .map_err(fail),
            AgentId::QaTester => serde_json::from_value(data.clone())
                .map(StagePayload::QaAssignment)
                .map_err(fail),
            AgentId::QualityReviewer => serde_json::from_value(data.clone())
                .map(StagePayload::ReviewDossier)
                .map_err(fail),
            AgentId::Deployment => Err(PipelineError::BusinessLogic {
                story_id: story_id.to_string(),
                detail: "deployment is a terminal target and consumes no payload".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_feature_request() {
        let data = json!({
            "feature_description": "practice invoice approval",
            "time_constraint_minutes": 8,
            "requested_by": "sh-1"
        });
        let payload = StagePayload::decode_for(AgentId::ProjectManager, "story-1", &data).unwrap();
        match payload {
            StagePayload::FeatureRequest(req) => {
                assert_eq!(req.time_constraint_minutes, 8);
                assert_eq!(req.requested_by.as_deref(), Some("sh-1"));
            }
            other => panic!("expected FeatureRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_is_business_logic_error() {
        let data = json!({ "time_constraint_minutes": 8 });
        let err =
            StagePayload::decode_for(AgentId::ProjectManager, "story-1", &data).unwrap_err();
        match err {
            PipelineError::BusinessLogic { story_id, detail } => {
                assert_eq!(story_id, "story-1");
                assert!(detail.contains("project_manager"));
            }
            other => panic!("expected BusinessLogic, got {other:?}"),
        }
    }

    #[test]
    fn test_developer_accepts_design_or_rework() {
        let design = json!({
            "design": {
                "mechanics": ["drag_and_drop"],
                "ui_components": ["card_list"],
                "interaction_flow": ["open", "sort", "submit"]
            },
            "acceptance_criteria": ["player can sort invoices"]
        });
        let payload = StagePayload::decode_for(AgentId::Developer, "story-1", &design).unwrap();
        assert!(matches!(
            payload,
            StagePayload::ImplementationOrder(ImplementationOrder::Design(_))
        ));

        let rework = json!({
            "rework_notes": ["raise coverage"],
            "blocking_issues": ["coverage below minimum"],
            "implemented_files": ["frontend/components/story-1.tsx"],
            "test_files": ["tests/frontend/story-1.test.tsx"],
            "acceptance_criteria": ["player can sort invoices"]
        });
        let payload = StagePayload::decode_for(AgentId::Developer, "story-1", &rework).unwrap();
        assert!(matches!(
            payload,
            StagePayload::ImplementationOrder(ImplementationOrder::Rework(_))
        ));
    }

    #[test]
    fn test_deployment_consumes_no_payload() {
        let err = StagePayload::decode_for(AgentId::Deployment, "story-1", &json!({}))
            .unwrap_err();
        assert!(matches!(err, PipelineError::BusinessLogic { .. }));
    }
}
