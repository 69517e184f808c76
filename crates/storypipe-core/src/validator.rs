//! Contract validation.
//!
//! Validates a JSON document against the contract schema before any agent
//! touches it: required top-level fields, exact DNA principle key sets,
//! the permitted agent sequence, and known quality gate names. All errors
//! are collected into one report — there are no partial or soft failures;
//! a single structural violation makes the whole contract invalid and the
//! caller decides whether to reject or raise.

use serde_json::Value;

use crate::domain::contract::{
    Contract, ARCHITECTURE_PRINCIPLE_KEYS, DESIGN_PRINCIPLE_KEYS,
};
use crate::domain::error::{PipelineError, Result};
use crate::domain::stage::AgentId;
use crate::gates::QualityGate;

/// Top-level keys every contract must carry.
pub const REQUIRED_TOP_LEVEL_KEYS: &[&str] = &[
    "contract_version",
    "story_id",
    "source_agent",
    "target_agent",
    "dna_compliance",
    "input_requirements",
    "output_specifications",
    "quality_gates",
    "handoff_criteria",
];

/// Outcome of validating one contract document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Contract schema validator.
///
/// Stateless; the permitted agent pairs come from the shared
/// [`PIPELINE_EDGES`](crate::domain::stage::PIPELINE_EDGES) table rather
/// than a private copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractValidator;

impl ContractValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a contract document, collecting every violation.
    pub fn validate_contract(&self, contract: &Value) -> ValidationReport {
        let mut errors = Vec::new();

        let Some(obj) = contract.as_object() else {
            return ValidationReport::from_errors(vec![
                "contract must be a JSON object".to_string()
            ]);
        };

        for key in REQUIRED_TOP_LEVEL_KEYS {
            if !obj.contains_key(*key) {
                errors.push(format!("missing required field: {key}"));
            }
        }

        self.check_dna_block(contract, &mut errors);
        self.check_agent_sequence(contract, &mut errors);
        self.check_quality_gates(contract, &mut errors);

        ValidationReport::from_errors(errors)
    }

    /// True iff `(source, target)` is an edge of the pipeline graph.
    pub fn validate_agent_sequence(&self, source: AgentId, target: AgentId) -> bool {
        source.allows_handoff(target)
    }

    /// Validate then deserialize. All-or-nothing: an invalid document
    /// never becomes a `Contract`.
    pub fn parse_contract(&self, value: &Value) -> Result<Contract> {
        let report = self.validate_contract(value);
        if !report.is_valid {
            let story_id = value
                .get("story_id")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            return Err(PipelineError::BusinessLogic {
                story_id,
                detail: format!("invalid contract: {}", report.errors.join("; ")),
            });
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    fn check_dna_block(&self, contract: &Value, errors: &mut Vec<String>) {
        let Some(dna) = contract.get("dna_compliance") else {
            return; // absence already reported as a missing top-level field
        };

        self.check_principle_map(
            dna.get("design_principles_validation"),
            "dna_compliance.design_principles_validation",
            DESIGN_PRINCIPLE_KEYS,
            errors,
        );
        self.check_principle_map(
            dna.get("architecture_compliance"),
            "dna_compliance.architecture_compliance",
            ARCHITECTURE_PRINCIPLE_KEYS,
            errors,
        );
    }

    /// A principle map must contain exactly `expected` keys, each boolean.
    fn check_principle_map(
        &self,
        map: Option<&Value>,
        path: &str,
        expected: &[&str],
        errors: &mut Vec<String>,
    ) {
        let Some(map) = map else {
            errors.push(format!("missing required field: {path}"));
            return;
        };
        let Some(obj) = map.as_object() else {
            errors.push(format!("{path} must be an object"));
            return;
        };

        for key in expected {
            match obj.get(*key) {
                None => errors.push(format!("{path} missing principle: {key}")),
                Some(v) if !v.is_boolean() => {
                    errors.push(format!("{path}.{key} must be a boolean"))
                }
                Some(_) => {}
            }
        }
        for key in obj.keys() {
            if !expected.contains(&key.as_str()) {
                errors.push(format!("{path} has unexpected principle: {key}"));
            }
        }
    }

    fn check_agent_sequence(&self, contract: &Value, errors: &mut Vec<String>) {
        let source = contract.get("source_agent").and_then(Value::as_str);
        let target = contract.get("target_agent").and_then(Value::as_str);

        let (Some(source), Some(target)) = (source, target) else {
            if contract.get("source_agent").is_some_and(|v| !v.is_string()) {
                errors.push("source_agent must be a string".to_string());
            }
            if contract.get("target_agent").is_some_and(|v| !v.is_string()) {
                errors.push("target_agent must be a string".to_string());
            }
            return;
        };

        let parsed_source = AgentId::parse(source);
        let parsed_target = AgentId::parse(target);

        if parsed_source.is_none() {
            errors.push(format!("unknown source_agent: {source}"));
        }
        if parsed_target.is_none() {
            errors.push(format!("unknown target_agent: {target}"));
        }

        if let (Some(from), Some(to)) = (parsed_source, parsed_target) {
            if !self.validate_agent_sequence(from, to) {
                errors.push(format!("handoff {from} -> {to} is not a permitted sequence"));
            }
        }
    }

    /// Unknown gate names are a hard validation error, never a silent pass.
    fn check_quality_gates(&self, contract: &Value, errors: &mut Vec<String>) {
        let Some(gates) = contract.get("quality_gates") else {
            return;
        };
        let Some(gates) = gates.as_array() else {
            errors.push("quality_gates must be an array".to_string());
            return;
        };

        for gate in gates {
            match gate.as_str() {
                None => errors.push("quality_gates entries must be strings".to_string()),
                Some(name) => {
                    if name.parse::<QualityGate>().is_err() {
                        errors.push(format!("unknown quality gate: {name}"));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_contract_value() -> Value {
        json!({
            "contract_version": "1.0",
            "story_id": "story-1",
            "source_agent": "project_manager",
            "target_agent": "game_designer",
            "dna_compliance": {
                "design_principles_validation": {
                    "pedagogical_value": true,
                    "policy_to_practice": true,
                    "time_respect": true,
                    "holistic_thinking": true,
                    "professional_tone": true
                },
                "architecture_compliance": {
                    "api_first": true,
                    "stateless_backend": true,
                    "separation_of_concerns": true,
                    "simplicity_first": true
                }
            },
            "input_requirements": {
                "required_files": [],
                "required_data": {},
                "required_validations": []
            },
            "output_specifications": {
                "deliverable_files": [],
                "deliverable_data": {},
                "validation_criteria": {}
            },
            "quality_gates": ["story_breakdown_complete", "dna_compliant"],
            "handoff_criteria": ["acceptance criteria defined"]
        })
    }

    #[test]
    fn test_valid_contract_passes() {
        let report = ContractValidator::new().validate_contract(&valid_contract_value());
        assert!(report.is_valid, "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn test_missing_top_level_key_collected() {
        let mut value = valid_contract_value();
        value.as_object_mut().unwrap().remove("handoff_criteria");
        let report = ContractValidator::new().validate_contract(&value);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("handoff_criteria")));
    }

    #[test]
    fn test_missing_design_principle_collected() {
        let mut value = valid_contract_value();
        value["dna_compliance"]["design_principles_validation"]
            .as_object_mut()
            .unwrap()
            .remove("time_respect");
        let report = ContractValidator::new().validate_contract(&value);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("missing principle: time_respect")));
    }

    #[test]
    fn test_extra_architecture_principle_collected() {
        let mut value = valid_contract_value();
        value["dna_compliance"]["architecture_compliance"]["event_driven"] = json!(true);
        let report = ContractValidator::new().validate_contract(&value);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("unexpected principle: event_driven")));
    }

    #[test]
    fn test_non_boolean_principle_collected() {
        let mut value = valid_contract_value();
        value["dna_compliance"]["design_principles_validation"]["time_respect"] = json!("yes");
        let report = ContractValidator::new().validate_contract(&value);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("must be a boolean")));
    }

    #[test]
    fn test_forbidden_agent_sequence_collected() {
        let mut value = valid_contract_value();
        value["target_agent"] = json!("qa_tester");
        let report = ContractValidator::new().validate_contract(&value);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("not a permitted")));
    }

    #[test]
    fn test_unknown_agent_collected() {
        let mut value = valid_contract_value();
        value["source_agent"] = json!("scrum_master");
        let report = ContractValidator::new().validate_contract(&value);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("unknown source_agent: scrum_master")));
    }

    #[test]
    fn test_unknown_quality_gate_is_hard_error() {
        let mut value = valid_contract_value();
        // A typo like this passed silently in earlier designs; now it is
        // rejected at validation time.
        value["quality_gates"] = json!(["story_breakdwon_complete"]);
        let report = ContractValidator::new().validate_contract(&value);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("unknown quality gate: story_breakdwon_complete")));
    }

    #[test]
    fn test_multiple_errors_all_collected() {
        let mut value = valid_contract_value();
        value.as_object_mut().unwrap().remove("story_id");
        value["target_agent"] = json!("developer");
        value["dna_compliance"]["architecture_compliance"]
            .as_object_mut()
            .unwrap()
            .remove("api_first");
        let report = ContractValidator::new().validate_contract(&value);
        assert!(!report.is_valid);
        assert!(report.errors.len() >= 3);
    }

    #[test]
    fn test_parse_contract_round_trip() {
        let contract = ContractValidator::new()
            .parse_contract(&valid_contract_value())
            .unwrap();
        assert_eq!(contract.story_id, "story-1");
        assert_eq!(contract.source_agent, AgentId::ProjectManager);

        let report = ContractValidator::new().validate_contract(&contract.to_value());
        assert!(report.is_valid);
    }

    #[test]
    fn test_parse_contract_rejects_invalid() {
        let mut value = valid_contract_value();
        value["target_agent"] = json!("deployment");
        let err = ContractValidator::new().parse_contract(&value).unwrap_err();
        assert!(matches!(err, PipelineError::BusinessLogic { .. }));
    }

    #[test]
    fn test_non_object_contract_rejected() {
        let report = ContractValidator::new().validate_contract(&json!([1, 2, 3]));
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
    }
}
