//! Game designer: maps the story breakdown onto game mechanics.

use async_trait::async_trait;
use serde_json::json;

use crate::agents::{
    append_criteria, append_gates, check_own_gates, ensure_addressed_to, extract_payload,
    PipelineAgent,
};
use crate::config::StageThresholds;
use crate::domain::contract::{Contract, InputRequirements, OutputSpecifications};
use crate::domain::error::Result;
use crate::domain::payload::{DesignBrief, DesignHandoff, GameDesign};
use crate::domain::stage::AgentId;
use crate::gates::QualityGate;

const OWN_GATES: &[QualityGate] = &[QualityGate::DesignDocumented, QualityGate::DnaCompliant];

/// Keyword-to-mechanic mapping applied to the feature description.
const MECHANIC_RULES: &[(&str, &str)] = &[
    ("sort", "drag_and_drop_sorting"),
    ("review", "case_review"),
    ("approve", "case_review"),
    ("quiz", "multiple_choice"),
    ("question", "multiple_choice"),
    ("budget", "resource_allocation"),
    ("allocate", "resource_allocation"),
    ("match", "pair_matching"),
];

/// Game designer agent.
pub struct GameDesignerAgent {
    thresholds: StageThresholds,
}

impl GameDesignerAgent {
    pub fn new(thresholds: StageThresholds) -> Self {
        Self { thresholds }
    }

    /// Derive mechanics, UI components and an interaction flow from the
    /// brief. Deterministic: the same brief always yields the same design.
    fn derive_design(&self, brief: &DesignBrief) -> GameDesign {
        let haystack = brief.feature_description.to_lowercase();

        let mut mechanics: Vec<String> = MECHANIC_RULES
            .iter()
            .filter(|(keyword, _)| haystack.contains(keyword))
            .map(|(_, mechanic)| mechanic.to_string())
            .collect();
        mechanics.dedup();
        if mechanics.is_empty() {
            mechanics.push("guided_walkthrough".to_string());
        }

        let mut ui_components = vec![
            "scenario_intro".to_string(),
            "progress_indicator".to_string(),
            "summary_screen".to_string(),
        ];
        if haystack.contains("feedback") {
            ui_components.push("feedback_panel".to_string());
        }

        let mut interaction_flow = vec!["intro".to_string()];
        for criterion in &brief.acceptance_criteria {
            interaction_flow.push(format!("task: {criterion}"));
        }
        interaction_flow.push("summary".to_string());

        GameDesign {
            mechanics,
            ui_components,
            interaction_flow,
        }
    }
}

#[async_trait]
impl PipelineAgent for GameDesignerAgent {
    fn stage(&self) -> AgentId {
        AgentId::GameDesigner
    }

    async fn process_contract(&self, input: &Contract) -> Result<Contract> {
        ensure_addressed_to(self.stage(), input)?;
        let brief: DesignBrief = extract_payload(self.stage(), input)?;

        let design = self.derive_design(&brief);

        let story_id = input.story_id.clone();
        let spec_doc = format!("docs/specs/design_{story_id}.md");

        let dna_compliance = input.dna_compliance.clone().with_stage_validation(
            "design_validation",
            json!({
                "mechanics": design.mechanics.len(),
                "ui_components": design.ui_components.len(),
                "time_constraint_minutes": brief.time_constraint_minutes,
            }),
        );

        let handoff = DesignHandoff {
            design: design.clone(),
            acceptance_criteria: brief.acceptance_criteria.clone(),
        };

        let mut contract = Contract {
            contract_version: input.contract_version.clone(),
            story_id,
            source_agent: AgentId::GameDesigner,
            target_agent: AgentId::Developer,
            dna_compliance,
            input_requirements: InputRequirements {
                required_files: vec![spec_doc.clone()],
                required_data: serde_json::to_value(&handoff)?,
                required_validations: vec!["design_documented".to_string()],
            },
            output_specifications: OutputSpecifications {
                deliverable_files: vec![spec_doc],
                deliverable_data: json!({
                    "design": design,
                    "acceptance_criteria": brief.acceptance_criteria,
                }),
                validation_criteria: json!({}),
            },
            quality_gates: append_gates(input, OWN_GATES),
            handoff_criteria: append_criteria(input, &["game design documented"]),
        };

        check_own_gates(&mut contract, OWN_GATES, &self.thresholds);
        Ok(contract)
    }
}
