//! Per-stage agents.
//!
//! Every agent follows the same internal control flow for one story:
//! RECEIVED -> TOOLS_RUN -> QUALITY_GATES_CHECKED -> CONTRACT_BUILT ->
//! (HANDED_OFF | REJECTED). None of it is persisted — it is plain
//! control flow inside one `process_contract` call.
//!
//! Two error policies meet here, on purpose:
//! - payload extraction fails fast (`BusinessLogic`, raised immediately);
//! - gate checking fails soft (a checker error becomes a failed gate).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::StageThresholds;
use crate::domain::contract::Contract;
use crate::domain::error::{PipelineError, Result};
use crate::domain::stage::AgentId;
use crate::gates::{evaluate_gates, GateOutcome, QualityGate};

mod developer;
mod game_designer;
mod project_manager;
mod qa_tester;
mod quality_reviewer;
mod test_engineer;

pub use developer::DeveloperAgent;
pub use game_designer::GameDesignerAgent;
pub use project_manager::ProjectManagerAgent;
pub use qa_tester::QaTesterAgent;
pub use quality_reviewer::QualityReviewerAgent;
pub use test_engineer::TestEngineerAgent;

/// One stage of the pipeline: consume the prior stage's contract,
/// produce the next one.
#[async_trait]
pub trait PipelineAgent: Send + Sync {
    /// The stage this agent implements.
    fn stage(&self) -> AgentId;

    /// Process an incoming contract and build the outgoing one.
    async fn process_contract(&self, input: &Contract) -> Result<Contract>;
}

/// Fail fast when a contract was delivered to the wrong stage.
pub(crate) fn ensure_addressed_to(stage: AgentId, input: &Contract) -> Result<()> {
    if input.target_agent != stage {
        return Err(PipelineError::BusinessLogic {
            story_id: input.story_id.clone(),
            detail: format!(
                "contract targets {} but was delivered to {stage}",
                input.target_agent
            ),
        });
    }
    Ok(())
}

/// Decode the stage payload from `input_requirements.required_data`.
/// Missing or malformed data is a business-logic error, raised before
/// any tool runs.
pub(crate) fn extract_payload<T: DeserializeOwned>(stage: AgentId, input: &Contract) -> Result<T> {
    serde_json::from_value(input.input_requirements.required_data.clone()).map_err(|e| {
        PipelineError::BusinessLogic {
            story_id: input.story_id.clone(),
            detail: format!("required_data does not match {stage} payload: {e}"),
        }
    })
}

/// Append this stage's gates to the predecessor list (append-only; a
/// stage never removes what earlier stages declared).
pub(crate) fn append_gates(input: &Contract, own: &[QualityGate]) -> Vec<String> {
    let mut gates = input.quality_gates.clone();
    for gate in own {
        let name = gate.as_str().to_string();
        if !gates.contains(&name) {
            gates.push(name);
        }
    }
    gates
}

/// Append this stage's handoff criteria to the predecessor list.
pub(crate) fn append_criteria(input: &Contract, own: &[&str]) -> Vec<String> {
    let mut criteria = input.handoff_criteria.clone();
    for item in own {
        let item = item.to_string();
        if !criteria.contains(&item) {
            criteria.push(item);
        }
    }
    criteria
}

/// Evaluate the stage's own gates against the freshly built contract and
/// fold the results into its `validation_criteria`. Gate failures are
/// logged, never raised.
pub(crate) fn check_own_gates(
    contract: &mut Contract,
    own: &[QualityGate],
    thresholds: &StageThresholds,
) -> GateOutcome {
    let outcome = evaluate_gates(own, contract, thresholds);
    if !outcome.all_passed() {
        warn!(
            story_id = %contract.story_id,
            stage = %contract.source_agent,
            failed = ?outcome.failed_gates(),
            "quality gates failed; contract handed off with failing gates recorded"
        );
    }
    contract.output_specifications.validation_criteria = serde_json::json!({
        "quality_gate_results": outcome.results,
    });
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{
        DnaCompliance, InputRequirements, OutputSpecifications, CONTRACT_VERSION,
    };
    use serde_json::json;

    fn contract(target: AgentId) -> Contract {
        Contract {
            contract_version: CONTRACT_VERSION.to_string(),
            story_id: "story-m".to_string(),
            source_agent: AgentId::ProjectManager,
            target_agent: target,
            dna_compliance: DnaCompliance::fully_compliant(),
            input_requirements: InputRequirements {
                required_files: vec![],
                required_data: json!({}),
                required_validations: vec![],
            },
            output_specifications: OutputSpecifications {
                deliverable_files: vec![],
                deliverable_data: json!({}),
                validation_criteria: json!({}),
            },
            quality_gates: vec!["story_breakdown_complete".to_string()],
            handoff_criteria: vec!["acceptance criteria defined".to_string()],
        }
    }

    #[test]
    fn test_misaddressed_contract_fails_fast() {
        let input = contract(AgentId::Developer);
        let err = ensure_addressed_to(AgentId::GameDesigner, &input).unwrap_err();
        assert!(matches!(err, PipelineError::BusinessLogic { .. }));
        assert!(err.to_string().contains("game_designer"));
    }

    #[test]
    fn test_append_gates_preserves_predecessors_and_dedupes() {
        let input = contract(AgentId::GameDesigner);
        let gates = append_gates(
            &input,
            &[QualityGate::StoryBreakdownComplete, QualityGate::DesignDocumented],
        );
        assert_eq!(
            gates,
            vec!["story_breakdown_complete", "design_documented"]
        );
    }

    #[test]
    fn test_append_criteria_keeps_order() {
        let input = contract(AgentId::GameDesigner);
        let criteria = append_criteria(&input, &["game design documented"]);
        assert_eq!(
            criteria,
            vec!["acceptance criteria defined", "game design documented"]
        );
    }
}
