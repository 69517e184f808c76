//! The Contract entity — the handoff document exchanged between stages.
//!
//! The JSON shape is the wire format the test suite asserts key-for-key:
//! a contract serialized by one stage must deserialize unchanged for the
//! next. The contract never carries its own digest; digests are computed
//! at handoff time and recorded in the project ledger instead, so the
//! wire shape stays fixed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::stage::AgentId;

/// Fixed contract schema version.
pub const CONTRACT_VERSION: &str = "1.0";

/// The five design principle keys, in wire order.
pub const DESIGN_PRINCIPLE_KEYS: &[&str] = &[
    "pedagogical_value",
    "policy_to_practice",
    "time_respect",
    "holistic_thinking",
    "professional_tone",
];

/// The four architecture principle keys, in wire order.
pub const ARCHITECTURE_PRINCIPLE_KEYS: &[&str] = &[
    "api_first",
    "stateless_backend",
    "separation_of_concerns",
    "simplicity_first",
];

/// Boolean verdicts for the five design principles.
///
/// `deny_unknown_fields` keeps the wire shape exact: a contract carrying
/// a sixth principle (or misspelling one) fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignPrinciples {
    pub pedagogical_value: bool,
    pub policy_to_practice: bool,
    pub time_respect: bool,
    pub holistic_thinking: bool,
    pub professional_tone: bool,
}

impl DesignPrinciples {
    pub fn all_true() -> Self {
        Self {
            pedagogical_value: true,
            policy_to_practice: true,
            time_respect: true,
            holistic_thinking: true,
            professional_tone: true,
        }
    }

    pub fn all_compliant(&self) -> bool {
        self.pedagogical_value
            && self.policy_to_practice
            && self.time_respect
            && self.holistic_thinking
            && self.professional_tone
    }
}

/// Boolean verdicts for the four architecture principles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchitecturePrinciples {
    pub api_first: bool,
    pub stateless_backend: bool,
    pub separation_of_concerns: bool,
    pub simplicity_first: bool,
}

impl ArchitecturePrinciples {
    pub fn all_true() -> Self {
        Self {
            api_first: true,
            stateless_backend: true,
            separation_of_concerns: true,
            simplicity_first: true,
        }
    }

    pub fn all_compliant(&self) -> bool {
        self.api_first
            && self.stateless_backend
            && self.separation_of_concerns
            && self.simplicity_first
    }
}

/// DNA compliance block carried by every contract.
///
/// Stages may enrich the block with their own validation sub-objects
/// (e.g. `"qa_validation"`); those land in the flattened map so the
/// mandatory nine principle keys stay typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnaCompliance {
    pub design_principles_validation: DesignPrinciples,
    pub architecture_compliance: ArchitecturePrinciples,
    #[serde(flatten)]
    pub stage_validations: BTreeMap<String, serde_json::Value>,
}

impl DnaCompliance {
    /// A block with every principle passing and no stage enrichments.
    pub fn fully_compliant() -> Self {
        Self {
            design_principles_validation: DesignPrinciples::all_true(),
            architecture_compliance: ArchitecturePrinciples::all_true(),
            stage_validations: BTreeMap::new(),
        }
    }

    pub fn all_compliant(&self) -> bool {
        self.design_principles_validation.all_compliant()
            && self.architecture_compliance.all_compliant()
    }

    /// Attach (or replace) a stage's validation sub-object.
    pub fn with_stage_validation(mut self, key: &str, value: serde_json::Value) -> Self {
        self.stage_validations.insert(key.to_string(), value);
        self
    }
}

/// What the receiving stage needs before it can start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRequirements {
    pub required_files: Vec<String>,
    pub required_data: serde_json::Value,
    pub required_validations: Vec<String>,
}

/// What the producing stage promises to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpecifications {
    pub deliverable_files: Vec<String>,
    pub deliverable_data: serde_json::Value,
    pub validation_criteria: serde_json::Value,
}

/// The handoff document passed between pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub contract_version: String,
    pub story_id: String,
    pub source_agent: AgentId,
    pub target_agent: AgentId,
    pub dna_compliance: DnaCompliance,
    pub input_requirements: InputRequirements,
    pub output_specifications: OutputSpecifications,
    pub quality_gates: Vec<String>,
    pub handoff_criteria: Vec<String>,
}

impl Contract {
    /// SHA-256 hex digest of the serialized contract.
    ///
    /// Recorded in ledger events at each handoff so tampering between
    /// stages is detectable; not embedded in the contract itself.
    pub fn digest(&self) -> String {
        use sha2::Digest as _;
        // Contract serialization cannot fail: all maps are string-keyed.
        let bytes = serde_json::to_vec(self).expect("contract serialization is infallible");
        hex::encode(sha2::Sha256::digest(&bytes))
    }

    /// Serialize to a JSON value (the validator's input type).
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("contract serialization is infallible")
    }
}
