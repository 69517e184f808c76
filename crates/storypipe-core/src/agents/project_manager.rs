//! Project manager: turns a feature request into the first contract.
//!
//! The only stage with no inbound edge in the handoff graph — its input
//! is the raw feature request. `process_contract` is still provided for
//! callers that deliver the request wrapped in a contract envelope.

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::agents::{check_own_gates, ensure_addressed_to, extract_payload, PipelineAgent};
use crate::config::StageThresholds;
use crate::domain::contract::{
    Contract, DnaCompliance, InputRequirements, OutputSpecifications, CONTRACT_VERSION,
};
use crate::domain::error::Result;
use crate::domain::payload::{DesignBrief, FeatureRequest};
use crate::domain::stage::AgentId;
use crate::gates::QualityGate;
use crate::tools::dna::DnaComplianceChecker;
use crate::tools::story::StoryAnalyzer;

const OWN_GATES: &[QualityGate] = &[
    QualityGate::StoryBreakdownComplete,
    QualityGate::DnaCompliant,
];

/// Project manager agent.
pub struct ProjectManagerAgent {
    thresholds: StageThresholds,
    analyzer: StoryAnalyzer,
    dna_checker: DnaComplianceChecker,
}

impl ProjectManagerAgent {
    pub fn new(thresholds: StageThresholds) -> Self {
        Self {
            thresholds,
            analyzer: StoryAnalyzer::new(),
            dna_checker: DnaComplianceChecker::new(),
        }
    }

    /// Pipeline entry point: break the feature down, score DNA
    /// compliance, and build the contract for the game designer.
    pub async fn process_feature(&self, feature: &FeatureRequest) -> Result<Contract> {
        let story_id = feature
            .story_id
            .clone()
            .unwrap_or_else(|| generate_story_id());

        // Tools run strictly in sequence.
        let breakdown = self.analyzer.analyze(&story_id, feature);
        let analysis = self.dna_checker.analyze(feature);

        let dna_compliance = DnaCompliance {
            design_principles_validation: analysis.to_design_principles(),
            architecture_compliance: analysis.to_architecture_principles(),
            stage_validations: Default::default(),
        }
        .with_stage_validation(
            "pm_validation",
            json!({
                "compliance_score": analysis.compliance_score,
                "violations": analysis.violations,
                "recommendations": analysis.recommendations,
            }),
        );

        let brief = DesignBrief {
            feature_description: feature.feature_description.clone(),
            acceptance_criteria: breakdown.acceptance_criteria.clone(),
            complexity: breakdown.complexity,
            time_constraint_minutes: feature.time_constraint_minutes,
        };

        let story_doc = format!("docs/stories/{story_id}.md");

        let mut contract = Contract {
            contract_version: CONTRACT_VERSION.to_string(),
            story_id: story_id.clone(),
            source_agent: AgentId::ProjectManager,
            target_agent: AgentId::GameDesigner,
            dna_compliance,
            input_requirements: InputRequirements {
                required_files: vec![story_doc.clone()],
                required_data: serde_json::to_value(&brief)?,
                required_validations: vec!["dna_principles_validated".to_string()],
            },
            output_specifications: OutputSpecifications {
                deliverable_files: vec![story_doc],
                deliverable_data: json!({
                    "acceptance_criteria": breakdown.acceptance_criteria,
                    "complexity": breakdown.complexity,
                    "estimated_effort_hours": breakdown.estimated_effort_hours,
                    "compliance_score": analysis.compliance_score,
                }),
                validation_criteria: json!({}),
            },
            quality_gates: OWN_GATES.iter().map(|g| g.as_str().to_string()).collect(),
            handoff_criteria: vec![
                "acceptance criteria defined".to_string(),
                "dna principles validated".to_string(),
            ],
        };

        check_own_gates(&mut contract, OWN_GATES, &self.thresholds);
        Ok(contract)
    }
}

fn generate_story_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("story-{}", &id[..8])
}

#[async_trait]
impl PipelineAgent for ProjectManagerAgent {
    fn stage(&self) -> AgentId {
        AgentId::ProjectManager
    }

    async fn process_contract(&self, input: &Contract) -> Result<Contract> {
        ensure_addressed_to(self.stage(), input)?;
        let mut feature: FeatureRequest = extract_payload(self.stage(), input)?;
        // The envelope's story id wins so the id stays stable.
        feature.story_id.get_or_insert_with(|| input.story_id.clone());
        self.process_feature(&feature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ContractValidator;

    fn rich_feature() -> FeatureRequest {
        FeatureRequest {
            story_id: Some("story-pm1".to_string()),
            feature_description:
                "A focused practice scenario where municipal employees learn to apply the \
                 travel expense policy. Players review three short invoice cases, get \
                 instant feedback after each step, and see progress toward the learning \
                 objective. Sessions stay concise and efficient. The intro explains the \
                 organisational context and the impact on colleagues across the \
                 organisation, written in clear, professional language. Players must \
                 complete all three cases. The summary should list each decision."
                    .to_string(),
            time_constraint_minutes: 8,
            requested_by: Some("sh-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_feature_becomes_valid_designer_contract() {
        let agent = ProjectManagerAgent::new(StageThresholds::default());
        let contract = agent.process_feature(&rich_feature()).await.unwrap();

        assert_eq!(contract.story_id, "story-pm1");
        assert_eq!(contract.source_agent, AgentId::ProjectManager);
        assert_eq!(contract.target_agent, AgentId::GameDesigner);
        assert!(contract.dna_compliance.all_compliant());

        let report = ContractValidator::new().validate_contract(&contract.to_value());
        assert!(report.is_valid, "errors: {:?}", report.errors);
    }

    #[tokio::test]
    async fn test_designer_brief_is_decodable() {
        let agent = ProjectManagerAgent::new(StageThresholds::default());
        let contract = agent.process_feature(&rich_feature()).await.unwrap();

        let brief: DesignBrief =
            serde_json::from_value(contract.input_requirements.required_data).unwrap();
        assert_eq!(brief.time_constraint_minutes, 8);
        assert_eq!(brief.acceptance_criteria.len(), 2);
    }

    #[tokio::test]
    async fn test_story_id_generated_when_absent() {
        let agent = ProjectManagerAgent::new(StageThresholds::default());
        let mut feature = rich_feature();
        feature.story_id = None;
        let contract = agent.process_feature(&feature).await.unwrap();
        assert!(contract.story_id.starts_with("story-"));
        assert_eq!(contract.story_id.len(), "story-".len() + 8);
    }

    #[tokio::test]
    async fn test_non_compliant_feature_still_hands_off_with_failing_gates() {
        let agent = ProjectManagerAgent::new(StageThresholds::default());
        let feature = FeatureRequest {
            story_id: Some("story-pm2".to_string()),
            feature_description: "a thing".to_string(),
            time_constraint_minutes: 25,
            requested_by: None,
        };

        // Gate failures are soft at this stage: the contract is still
        // produced, carrying the failing booleans.
        let contract = agent.process_feature(&feature).await.unwrap();
        assert!(!contract.dna_compliance.all_compliant());
        let results = &contract.output_specifications.validation_criteria
            ["quality_gate_results"];
        assert!(results
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r["gate"] == "dna_compliant" && r["passed"] == false));
    }

    #[tokio::test]
    async fn test_process_contract_unwraps_envelope() {
        let agent = ProjectManagerAgent::new(StageThresholds::default());
        let direct = agent.process_feature(&rich_feature()).await.unwrap();

        let envelope = Contract {
            contract_version: CONTRACT_VERSION.to_string(),
            story_id: "story-pm1".to_string(),
            source_agent: AgentId::ProjectManager,
            target_agent: AgentId::ProjectManager,
            dna_compliance: DnaCompliance::fully_compliant(),
            input_requirements: InputRequirements {
                required_files: vec![],
                required_data: serde_json::to_value(rich_feature()).unwrap(),
                required_validations: vec![],
            },
            output_specifications: OutputSpecifications {
                deliverable_files: vec![],
                deliverable_data: json!({}),
                validation_criteria: json!({}),
            },
            quality_gates: vec![],
            handoff_criteria: vec![],
        };

        let via_contract = agent.process_contract(&envelope).await.unwrap();
        assert_eq!(via_contract.story_id, direct.story_id);
        assert_eq!(via_contract.quality_gates, direct.quality_gates);
    }
}
