//! DNA principle compliance scoring.
//!
//! Five design principles are scored additively from keyword buckets
//! (pessimistic: every point must be earned), four architecture
//! principles start at 80 and are only decremented by red-flag matches
//! (optimistic: points are only lost). The aggregate weighs design 60%
//! and architecture 40%, rounded to one decimal.

use serde::{Deserialize, Serialize};

use crate::domain::contract::{ArchitecturePrinciples, DesignPrinciples};
use crate::domain::error::{PipelineError, Result};
use crate::domain::payload::FeatureRequest;
use crate::tools::score::{clamp_score, round1, KeywordBucket, ScoreResult};

/// Session length ceiling enforced by the time_respect principle.
pub const TIME_CEILING_MINUTES: u32 = 10;

/// The five design principles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignPrinciple {
    PedagogicalValue,
    PolicyToPractice,
    TimeRespect,
    HolisticThinking,
    ProfessionalTone,
}

impl DesignPrinciple {
    pub const ALL: [DesignPrinciple; 5] = [
        DesignPrinciple::PedagogicalValue,
        DesignPrinciple::PolicyToPractice,
        DesignPrinciple::TimeRespect,
        DesignPrinciple::HolisticThinking,
        DesignPrinciple::ProfessionalTone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PedagogicalValue => "pedagogical_value",
            Self::PolicyToPractice => "policy_to_practice",
            Self::TimeRespect => "time_respect",
            Self::HolisticThinking => "holistic_thinking",
            Self::ProfessionalTone => "professional_tone",
        }
    }
}

/// The four architecture principles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitecturePrinciple {
    ApiFirst,
    StatelessBackend,
    SeparationOfConcerns,
    SimplicityFirst,
}

impl ArchitecturePrinciple {
    pub const ALL: [ArchitecturePrinciple; 4] = [
        ArchitecturePrinciple::ApiFirst,
        ArchitecturePrinciple::StatelessBackend,
        ArchitecturePrinciple::SeparationOfConcerns,
        ArchitecturePrinciple::SimplicityFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiFirst => "api_first",
            Self::StatelessBackend => "stateless_backend",
            Self::SeparationOfConcerns => "separation_of_concerns",
            Self::SimplicityFirst => "simplicity_first",
        }
    }
}

// -- keyword tables ----------------------------------------------------------

const PEDAGOGICAL_LEARNING: KeywordBucket = KeywordBucket {
    name: "learning",
    keywords: &[
        "learn",
        "teach",
        "practice",
        "practise",
        "skill",
        "understand",
        "knowledge",
        "training",
    ],
    breakpoints: &[(3, 40.0), (1, 20.0)],
};

const PEDAGOGICAL_ASSESSMENT: KeywordBucket = KeywordBucket {
    name: "assessment",
    keywords: &["feedback", "quiz", "assess", "progress", "evaluate"],
    breakpoints: &[(2, 30.0), (1, 15.0)],
};

const PEDAGOGICAL_OUTCOME: KeywordBucket = KeywordBucket {
    name: "learning outcome",
    keywords: &["objective", "goal", "outcome"],
    breakpoints: &[(1, 30.0)],
};

const POLICY_SOURCE: KeywordBucket = KeywordBucket {
    name: "policy source",
    keywords: &["policy", "guideline", "regulation", "directive", "standard"],
    breakpoints: &[(2, 40.0), (1, 20.0)],
};

const POLICY_PRACTICE: KeywordBucket = KeywordBucket {
    name: "practice link",
    keywords: &["apply", "applie", "workflow", "scenario", "everyday", "hands-on"],
    breakpoints: &[(2, 30.0), (1, 15.0)],
};

const POLICY_MAPPING: KeywordBucket = KeywordBucket {
    name: "worked example",
    keywords: &["example", "case", "situation"],
    breakpoints: &[(1, 30.0)],
};

const TIME_EFFICIENCY: KeywordBucket = KeywordBucket {
    name: "efficiency",
    keywords: &["quick", "concise", "focused", "efficient", "short", "streamlined"],
    breakpoints: &[(2, 30.0), (1, 15.0)],
};

const TIME_PACING: KeywordBucket = KeywordBucket {
    name: "pacing",
    keywords: &["chunk", "step", "module", "segment"],
    breakpoints: &[(1, 20.0)],
};

const HOLISTIC_CONTEXT: KeywordBucket = KeywordBucket {
    name: "context",
    keywords: &["context", "organisation", "organization", "stakeholder", "impact"],
    breakpoints: &[(3, 60.0), (1, 30.0)],
};

const HOLISTIC_INTEGRATION: KeywordBucket = KeywordBucket {
    name: "integration",
    keywords: &["integrate", "connect", "align", "holistic"],
    breakpoints: &[(2, 30.0), (1, 15.0)],
};

const HOLISTIC_TRADEOFF: KeywordBucket = KeywordBucket {
    name: "trade-off awareness",
    keywords: &["balance", "trade-off", "consequence"],
    breakpoints: &[(1, 20.0)],
};

const TONE_REGISTER: KeywordBucket = KeywordBucket {
    name: "register",
    keywords: &["professional", "respectful", "clear", "workplace"],
    breakpoints: &[(2, 40.0), (1, 20.0)],
};

const TONE_AUDIENCE: KeywordBucket = KeywordBucket {
    name: "audience",
    keywords: &["colleague", "practitioner", "civil servant", "municipal"],
    breakpoints: &[(1, 30.0)],
};

const TONE_CLARITY: KeywordBucket = KeywordBucket {
    name: "clarity",
    keywords: &["plain language", "jargon-free", "accessible"],
    breakpoints: &[(1, 30.0)],
};

/// Red flags per architecture principle. Each distinct match costs
/// [`ARCHITECTURE_PENALTY`] points off the [`ARCHITECTURE_BASELINE`].
const API_FIRST_FLAGS: &[&str] = &[
    "direct database access",
    "server-rendered",
    "bypass the api",
    "shared session",
];

const STATELESS_FLAGS: &[&str] = &[
    "session state",
    "sticky session",
    "server-side session",
    "in-memory user state",
];

const SEPARATION_FLAGS: &[&str] = &[
    "business logic in ui",
    "mixed concerns",
    "tight coupling",
    "god object",
];

const SIMPLICITY_FLAGS: &[&str] = &[
    "over-engineered",
    "premature optimization",
    "deep inheritance",
    "complex hierarchy",
];

/// Architecture principles start here and only lose points.
pub const ARCHITECTURE_BASELINE: f64 = 80.0;
/// Points lost per distinct red-flag match.
pub const ARCHITECTURE_PENALTY: f64 = 15.0;

// -- analysis result ---------------------------------------------------------

/// One scored principle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignPrincipleScore {
    pub principle: DesignPrinciple,
    pub result: ScoreResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitecturePrincipleScore {
    pub principle: ArchitecturePrinciple,
    pub result: ScoreResult,
}

/// Complete DNA analysis for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnaAnalysis {
    pub design: Vec<DesignPrincipleScore>,
    pub architecture: Vec<ArchitecturePrincipleScore>,
    /// Weighted aggregate: design 60%, architecture 40%, one decimal.
    pub compliance_score: f64,
    /// `"<class> principle violation: <name>"` per non-compliant dimension.
    pub violations: Vec<String>,
    /// Static next-step lookups keyed by the violated categories.
    pub recommendations: Vec<String>,
}

impl DnaAnalysis {
    pub fn compliant(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn design_result(&self, principle: DesignPrinciple) -> &ScoreResult {
        &self
            .design
            .iter()
            .find(|s| s.principle == principle)
            .expect("all design principles are scored")
            .result
    }

    pub fn architecture_result(&self, principle: ArchitecturePrinciple) -> &ScoreResult {
        &self
            .architecture
            .iter()
            .find(|s| s.principle == principle)
            .expect("all architecture principles are scored")
            .result
    }

    /// Boolean block for the contract's `design_principles_validation`.
    pub fn to_design_principles(&self) -> DesignPrinciples {
        DesignPrinciples {
            pedagogical_value: self.design_result(DesignPrinciple::PedagogicalValue).compliant,
            policy_to_practice: self.design_result(DesignPrinciple::PolicyToPractice).compliant,
            time_respect: self.design_result(DesignPrinciple::TimeRespect).compliant,
            holistic_thinking: self.design_result(DesignPrinciple::HolisticThinking).compliant,
            professional_tone: self.design_result(DesignPrinciple::ProfessionalTone).compliant,
        }
    }

    /// Boolean block for the contract's `architecture_compliance`.
    pub fn to_architecture_principles(&self) -> ArchitecturePrinciples {
        ArchitecturePrinciples {
            api_first: self.architecture_result(ArchitecturePrinciple::ApiFirst).compliant,
            stateless_backend: self
                .architecture_result(ArchitecturePrinciple::StatelessBackend)
                .compliant,
            separation_of_concerns: self
                .architecture_result(ArchitecturePrinciple::SeparationOfConcerns)
                .compliant,
            simplicity_first: self
                .architecture_result(ArchitecturePrinciple::SimplicityFirst)
                .compliant,
        }
    }
}

// -- checker -----------------------------------------------------------------

/// DNA compliance checker.
#[derive(Debug, Clone, Copy)]
pub struct DnaComplianceChecker {
    /// Additive design principles must reach this score.
    pub design_threshold: f64,
    /// time_respect is held to a stricter bar.
    pub time_respect_threshold: f64,
    /// Subtractive architecture principles must stay above this score.
    pub architecture_threshold: f64,
}

impl Default for DnaComplianceChecker {
    fn default() -> Self {
        Self {
            design_threshold: 60.0,
            time_respect_threshold: 70.0,
            architecture_threshold: 60.0,
        }
    }
}

impl DnaComplianceChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a feature payload taken straight from a contract.
    ///
    /// A payload that cannot be decoded is a failure of the analysis
    /// itself, not a compliance violation, and maps to
    /// [`PipelineError::DnaCompliance`]. No retry, no partial result.
    pub fn analyze_feature_compliance(&self, data: &serde_json::Value) -> Result<DnaAnalysis> {
        let feature: FeatureRequest = serde_json::from_value(data.clone())
            .map_err(|e| PipelineError::DnaCompliance(format!("cannot decode feature: {e}")))?;
        Ok(self.analyze(&feature))
    }

    /// Analyze a decoded feature request. Pure and deterministic.
    pub fn analyze(&self, feature: &FeatureRequest) -> DnaAnalysis {
        let design: Vec<DesignPrincipleScore> = DesignPrinciple::ALL
            .iter()
            .map(|principle| DesignPrincipleScore {
                principle: *principle,
                result: self.score_design_principle(*principle, feature),
            })
            .collect();

        let architecture: Vec<ArchitecturePrincipleScore> = ArchitecturePrinciple::ALL
            .iter()
            .map(|principle| ArchitecturePrincipleScore {
                principle: *principle,
                result: self.score_architecture_principle(
                    *principle,
                    &feature.feature_description,
                ),
            })
            .collect();

        let design_scores: Vec<f64> = design.iter().map(|s| s.result.score).collect();
        let architecture_scores: Vec<f64> =
            architecture.iter().map(|s| s.result.score).collect();
        let compliance_score = compliance_score(&design_scores, &architecture_scores);

        let mut violations = Vec::new();
        for scored in &design {
            if !scored.result.compliant {
                violations.push(format!(
                    "design principle violation: {}",
                    scored.principle.as_str()
                ));
            }
        }
        for scored in &architecture {
            if !scored.result.compliant {
                violations.push(format!(
                    "architecture principle violation: {}",
                    scored.principle.as_str()
                ));
            }
        }

        let recommendations = recommendations_for(&design, &architecture);

        DnaAnalysis {
            design,
            architecture,
            compliance_score,
            violations,
            recommendations,
        }
    }

    /// Additive scoring: start at zero and earn points per bucket.
    pub fn score_design_principle(
        &self,
        principle: DesignPrinciple,
        feature: &FeatureRequest,
    ) -> ScoreResult {
        let text = &feature.feature_description;
        let mut evidence = Vec::new();
        let mut issues = Vec::new();

        let (raw, threshold, recommendation) = match principle {
            DesignPrinciple::PedagogicalValue => {
                let raw = PEDAGOGICAL_LEARNING.score(text, &mut evidence, &mut issues)
                    + PEDAGOGICAL_ASSESSMENT.score(text, &mut evidence, &mut issues)
                    + PEDAGOGICAL_OUTCOME.score(text, &mut evidence, &mut issues);
                (raw, self.design_threshold, RECOMMEND_PEDAGOGICAL)
            }
            DesignPrinciple::PolicyToPractice => {
                let raw = POLICY_SOURCE.score(text, &mut evidence, &mut issues)
                    + POLICY_PRACTICE.score(text, &mut evidence, &mut issues)
                    + POLICY_MAPPING.score(text, &mut evidence, &mut issues);
                (raw, self.design_threshold, RECOMMEND_POLICY)
            }
            DesignPrinciple::TimeRespect => {
                let mut raw = 0.0;
                if feature.time_constraint_minutes <= TIME_CEILING_MINUTES {
                    raw += 50.0;
                    evidence.push(format!(
                        "session length {} minutes within the {} minute ceiling",
                        feature.time_constraint_minutes, TIME_CEILING_MINUTES
                    ));
                } else {
                    issues.push(format!(
                        "estimated completion time {} minutes exceeds recommended {} minutes",
                        feature.time_constraint_minutes, TIME_CEILING_MINUTES
                    ));
                }
                raw += TIME_EFFICIENCY.score(text, &mut evidence, &mut issues);
                raw += TIME_PACING.score(text, &mut evidence, &mut issues);
                (raw, self.time_respect_threshold, RECOMMEND_TIME)
            }
            DesignPrinciple::HolisticThinking => {
                let raw = HOLISTIC_CONTEXT.score(text, &mut evidence, &mut issues)
                    + HOLISTIC_INTEGRATION.score(text, &mut evidence, &mut issues)
                    + HOLISTIC_TRADEOFF.score(text, &mut evidence, &mut issues);
                (raw, self.design_threshold, RECOMMEND_HOLISTIC)
            }
            DesignPrinciple::ProfessionalTone => {
                let raw = TONE_REGISTER.score(text, &mut evidence, &mut issues)
                    + TONE_AUDIENCE.score(text, &mut evidence, &mut issues)
                    + TONE_CLARITY.score(text, &mut evidence, &mut issues);
                (raw, self.design_threshold, RECOMMEND_TONE)
            }
        };

        ScoreResult::from_parts(raw, threshold, evidence, issues, recommendation)
    }

    /// Subtractive scoring: start at the baseline and lose points per
    /// distinct red-flag match.
    pub fn score_architecture_principle(
        &self,
        principle: ArchitecturePrinciple,
        text: &str,
    ) -> ScoreResult {
        let flags = match principle {
            ArchitecturePrinciple::ApiFirst => API_FIRST_FLAGS,
            ArchitecturePrinciple::StatelessBackend => STATELESS_FLAGS,
            ArchitecturePrinciple::SeparationOfConcerns => SEPARATION_FLAGS,
            ArchitecturePrinciple::SimplicityFirst => SIMPLICITY_FLAGS,
        };

        let haystack = text.to_lowercase();
        let matched: Vec<&str> = flags
            .iter()
            .copied()
            .filter(|flag| haystack.contains(flag))
            .collect();

        let raw = ARCHITECTURE_BASELINE - ARCHITECTURE_PENALTY * matched.len() as f64;
        let mut evidence = Vec::new();
        let mut issues = Vec::new();
        if matched.is_empty() {
            evidence.push(format!("no {} red flags detected", principle.as_str()));
        } else {
            for flag in &matched {
                issues.push(format!("{} red flag: {flag}", principle.as_str()));
            }
        }

        ScoreResult::from_parts(
            raw,
            self.architecture_threshold,
            evidence,
            issues,
            RECOMMEND_ARCHITECTURE,
        )
    }
}

/// Weighted aggregate: design 60%, architecture 40%, one decimal.
///
/// Monotonic: raising any single dimension's score can never lower the
/// aggregate.
pub fn compliance_score(design: &[f64], architecture: &[f64]) -> f64 {
    let mean = |scores: &[f64]| {
        if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    };
    round1(clamp_score(0.6 * mean(design) + 0.4 * mean(architecture)))
}

const RECOMMEND_PEDAGOGICAL: &str =
    "Add explicit learning objectives and a feedback moment to the feature description.";
const RECOMMEND_POLICY: &str =
    "Tie the scenario to a named policy or guideline and show how it applies in practice.";
const RECOMMEND_TIME: &str =
    "Reduce scope until a full session fits within the 10 minute ceiling.";
const RECOMMEND_HOLISTIC: &str =
    "Describe the organisational context and who is affected by the feature.";
const RECOMMEND_TONE: &str =
    "Rewrite the description in plain, workplace-appropriate language.";
const RECOMMEND_ARCHITECTURE: &str =
    "Keep the client thin: route all state through the API and remove server-side coupling.";

/// Static recommendation lookup: one entry per violated category, in a
/// fixed order. No deeper reasoning than "which categories failed".
fn recommendations_for(
    design: &[DesignPrincipleScore],
    architecture: &[ArchitecturePrincipleScore],
) -> Vec<String> {
    let mut out = Vec::new();
    for scored in design {
        if !scored.result.compliant {
            out.push(scored.result.recommendation.clone());
        }
    }
    if architecture.iter().any(|s| !s.result.compliant) {
        out.push(RECOMMEND_ARCHITECTURE.to_string());
    }
    out.dedup();
    out
}
