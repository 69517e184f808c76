//! QA tester: compiles the quality report for the reviewer.

use async_trait::async_trait;
use serde_json::json;

use crate::agents::{
    append_criteria, append_gates, check_own_gates, ensure_addressed_to, extract_payload,
    PipelineAgent,
};
use crate::config::StageThresholds;
use crate::domain::contract::{Contract, InputRequirements, OutputSpecifications};
use crate::domain::error::Result;
use crate::domain::payload::{QaAssignment, ReviewDossier};
use crate::domain::stage::AgentId;
use crate::gates::QualityGate;
use crate::tools::quality::QualityScorer;

const OWN_GATES: &[QualityGate] = &[QualityGate::QualityScoreAcceptable];

/// QA tester agent.
pub struct QaTesterAgent {
    thresholds: StageThresholds,
    scorer: QualityScorer,
}

impl QaTesterAgent {
    pub fn new(thresholds: StageThresholds) -> Self {
        let scorer = QualityScorer::new(&thresholds);
        Self { thresholds, scorer }
    }
}

#[async_trait]
impl PipelineAgent for QaTesterAgent {
    fn stage(&self) -> AgentId {
        AgentId::QaTester
    }

    async fn process_contract(&self, input: &Contract) -> Result<Contract> {
        ensure_addressed_to(self.stage(), input)?;
        let assignment: QaAssignment = extract_payload(self.stage(), input)?;

        let report = self.scorer.score(&assignment);

        let story_id = input.story_id.clone();
        let qa_doc = format!("reports/qa/{story_id}.md");

        let dna_compliance = input.dna_compliance.clone().with_stage_validation(
            "qa_validation",
            json!({
                "overall_score": report.overall_score,
                "deployment_ready": report.deployment_ready,
            }),
        );

        let dossier = ReviewDossier {
            overall_score: report.overall_score,
            blocking_issues: report.blocking_issues.clone(),
            deployment_ready: report.deployment_ready,
            coverage_percent: assignment.coverage_percent,
            response_time_ms: assignment.response_time_ms,
            implemented_files: assignment.implemented_files.clone(),
            test_files: assignment.test_files.clone(),
            acceptance_criteria: assignment.acceptance_criteria.clone(),
        };

        let mut contract = Contract {
            contract_version: input.contract_version.clone(),
            story_id,
            source_agent: AgentId::QaTester,
            target_agent: AgentId::QualityReviewer,
            dna_compliance,
            input_requirements: InputRequirements {
                required_files: vec![qa_doc.clone()],
                required_data: serde_json::to_value(&dossier)?,
                required_validations: vec!["quality_score_acceptable".to_string()],
            },
            output_specifications: OutputSpecifications {
                deliverable_files: vec![qa_doc],
                deliverable_data: json!({
                    "overall_score": report.overall_score,
                    "dimensions": report.dimensions,
                    "blocking_issues": report.blocking_issues,
                    "deployment_ready": report.deployment_ready,
                }),
                validation_criteria: json!({}),
            },
            quality_gates: append_gates(input, OWN_GATES),
            handoff_criteria: append_criteria(input, &["quality report compiled"]),
        };

        check_own_gates(&mut contract, OWN_GATES, &self.thresholds);
        Ok(contract)
    }
}
