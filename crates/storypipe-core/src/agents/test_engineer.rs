//! Test engineer: builds the test plan and enforces the fatal gates.
//!
//! This is the one stage where threshold misses abort the story instead
//! of riding along in a report — a known-bad implementation never
//! reaches QA.

use async_trait::async_trait;
use serde_json::json;

use crate::agents::{
    append_criteria, append_gates, check_own_gates, ensure_addressed_to, extract_payload,
    PipelineAgent,
};
use crate::config::StageThresholds;
use crate::domain::contract::{Contract, InputRequirements, OutputSpecifications};
use crate::domain::error::Result;
use crate::domain::payload::{QaAssignment, TestAssignment};
use crate::domain::stage::AgentId;
use crate::gates::QualityGate;
use crate::tools::test_opt::AiTestOptimizer;

const OWN_GATES: &[QualityGate] = &[
    QualityGate::TestCoverageAdequate,
    QualityGate::PerformanceBudgetMet,
    QualityGate::SecurityScanClean,
];

/// Test engineer agent.
pub struct TestEngineerAgent {
    thresholds: StageThresholds,
    optimizer: AiTestOptimizer,
}

impl TestEngineerAgent {
    pub fn new(thresholds: StageThresholds) -> Self {
        let optimizer = AiTestOptimizer::new(
            thresholds.min_coverage_percent,
            thresholds.performance_budget_ms,
        );
        Self {
            thresholds,
            optimizer,
        }
    }
}

#[async_trait]
impl PipelineAgent for TestEngineerAgent {
    fn stage(&self) -> AgentId {
        AgentId::TestEngineer
    }

    async fn process_contract(&self, input: &Contract) -> Result<Contract> {
        ensure_addressed_to(self.stage(), input)?;
        let assignment: TestAssignment = extract_payload(self.stage(), input)?;

        let story_id = input.story_id.clone();

        // Fatal on coverage/performance/security shortfalls.
        let plan = self.optimizer.build_plan(&story_id, &assignment)?;

        let dna_compliance = input.dna_compliance.clone().with_stage_validation(
            "test_validation",
            json!({
                "coverage_percent": plan.coverage_percent,
                "response_time_ms": plan.response_time_ms,
            }),
        );

        let qa_assignment = QaAssignment {
            coverage_percent: plan.coverage_percent,
            response_time_ms: plan.response_time_ms,
            security_findings: plan.security_findings.clone(),
            implemented_files: assignment.implemented_files.clone(),
            test_files: plan.test_files.clone(),
            acceptance_criteria: assignment.acceptance_criteria.clone(),
        };

        let mut contract = Contract {
            contract_version: input.contract_version.clone(),
            story_id,
            source_agent: AgentId::TestEngineer,
            target_agent: AgentId::QaTester,
            dna_compliance,
            input_requirements: InputRequirements {
                required_files: plan.test_files.clone(),
                required_data: serde_json::to_value(&qa_assignment)?,
                required_validations: vec![
                    "test_coverage_adequate".to_string(),
                    "performance_budget_met".to_string(),
                ],
            },
            output_specifications: OutputSpecifications {
                deliverable_files: plan.test_files.clone(),
                deliverable_data: json!({
                    "coverage_percent": plan.coverage_percent,
                    "response_time_ms": plan.response_time_ms,
                    "security_findings": plan.security_findings,
                    "test_files": plan.test_files,
                }),
                validation_criteria: json!({}),
            },
            quality_gates: append_gates(input, OWN_GATES),
            handoff_criteria: append_criteria(input, &["test plan executed"]),
        };

        check_own_gates(&mut contract, OWN_GATES, &self.thresholds);
        Ok(contract)
    }
}
