//! Developer: produces the implementation manifest.
//!
//! Accepts either a fresh design handoff or a rework order routed back
//! by the quality reviewer — the two inbound edges the handoff graph
//! permits.

use async_trait::async_trait;
use serde_json::json;

use crate::agents::{
    append_criteria, append_gates, check_own_gates, ensure_addressed_to, extract_payload,
    PipelineAgent,
};
use crate::config::StageThresholds;
use crate::domain::contract::{Contract, InputRequirements, OutputSpecifications};
use crate::domain::error::Result;
use crate::domain::payload::{ImplementationOrder, TestAssignment};
use crate::domain::stage::AgentId;
use crate::gates::QualityGate;

const OWN_GATES: &[QualityGate] = &[QualityGate::CodeDelivered, QualityGate::DnaCompliant];

/// Developer agent.
pub struct DeveloperAgent {
    thresholds: StageThresholds,
}

impl DeveloperAgent {
    pub fn new(thresholds: StageThresholds) -> Self {
        Self { thresholds }
    }

    /// Produce the test assignment for the given order.
    fn implement(&self, story_id: &str, order: &ImplementationOrder) -> TestAssignment {
        match order {
            ImplementationOrder::Design(handoff) => TestAssignment {
                implemented_files: vec![
                    format!("frontend/components/{story_id}.tsx"),
                    format!("backend/endpoints/{story_id}.py"),
                ],
                test_files: vec![
                    format!("tests/frontend/{story_id}.test.tsx"),
                    format!("tests/backend/test_{story_id}.py"),
                ],
                api_endpoints: vec![format!("/api/{story_id}")],
                acceptance_criteria: handoff.acceptance_criteria.clone(),
                implementation_notes: format!(
                    "stateless endpoint /api/{story_id} serving mechanics: {}; thin client \
                     components render via the api only",
                    handoff.design.mechanics.join(", ")
                ),
            },
            ImplementationOrder::Rework(order) => {
                let mut test_files = order.test_files.clone();
                let regression = format!("tests/regression/{story_id}_rework.test.ts");
                if !test_files.contains(&regression) {
                    test_files.push(regression);
                }
                TestAssignment {
                    implemented_files: order.implemented_files.clone(),
                    test_files,
                    api_endpoints: vec![format!("/api/{story_id}")],
                    acceptance_criteria: order.acceptance_criteria.clone(),
                    // Findings are addressed, not echoed: review text may
                    // itself contain scanner red flags.
                    implementation_notes: format!(
                        "rework pass: addressed {} review finding(s); endpoints remain \
                         stateless behind the api",
                        order.blocking_issues.len().max(order.rework_notes.len())
                    ),
                }
            }
        }
    }
}

#[async_trait]
impl PipelineAgent for DeveloperAgent {
    fn stage(&self) -> AgentId {
        AgentId::Developer
    }

    async fn process_contract(&self, input: &Contract) -> Result<Contract> {
        ensure_addressed_to(self.stage(), input)?;
        let order: ImplementationOrder = extract_payload(self.stage(), input)?;

        let story_id = input.story_id.clone();
        let assignment = self.implement(&story_id, &order);

        let dna_compliance = input.dna_compliance.clone().with_stage_validation(
            "implementation_validation",
            json!({
                "implemented_files": assignment.implemented_files.len(),
                "test_files": assignment.test_files.len(),
                "rework": matches!(order, ImplementationOrder::Rework(_)),
            }),
        );

        let mut deliverable_files = assignment.implemented_files.clone();
        deliverable_files.extend(assignment.test_files.iter().cloned());

        let mut contract = Contract {
            contract_version: input.contract_version.clone(),
            story_id,
            source_agent: AgentId::Developer,
            target_agent: AgentId::TestEngineer,
            dna_compliance,
            input_requirements: InputRequirements {
                required_files: assignment.implemented_files.clone(),
                required_data: serde_json::to_value(&assignment)?,
                required_validations: vec!["code_delivered".to_string()],
            },
            output_specifications: OutputSpecifications {
                deliverable_files,
                deliverable_data: json!({
                    "implemented_files": assignment.implemented_files,
                    "test_files": assignment.test_files,
                    "api_endpoints": assignment.api_endpoints,
                }),
                validation_criteria: json!({}),
            },
            quality_gates: append_gates(input, OWN_GATES),
            handoff_criteria: append_criteria(input, &["implementation delivered"]),
        };

        check_own_gates(&mut contract, OWN_GATES, &self.thresholds);
        Ok(contract)
    }
}
