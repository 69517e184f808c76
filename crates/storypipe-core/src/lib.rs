//! StoryPipe Core Library
//!
//! Contract-driven AI software team pipeline: a feature request flows
//! Project Manager -> Game Designer -> Developer -> Test Engineer ->
//! QA Tester -> Quality Reviewer, with a structured contract handed off
//! and validated between every pair of stages.

pub mod agents;
pub mod approval;
pub mod config;
pub mod domain;
pub mod gates;
pub mod pipeline;
pub mod telemetry;
pub mod tools;
pub mod validator;

pub use agents::{
    DeveloperAgent, GameDesignerAgent, PipelineAgent, ProjectManagerAgent, QaTesterAgent,
    QualityReviewerAgent, TestEngineerAgent,
};
pub use approval::{ApprovalDecision, FinalApprover, ReviewSummary};
pub use config::{PipelineConfig, StageThresholds};
pub use domain::{
    AgentId, ArchitecturePrinciples, Complexity, Contract, DesignBrief, DesignHandoff,
    DesignPrinciples, DnaCompliance, FeatureRequest, GameDesign, ImplementationOrder,
    InputRequirements, OutputSpecifications, PipelineError, QaAssignment, Result, ReviewDossier,
    ReworkOrder, StagePayload, TestAssignment, ARCHITECTURE_PRINCIPLE_KEYS, CONTRACT_VERSION,
    DESIGN_PRINCIPLE_KEYS, PIPELINE_EDGES,
};
pub use gates::{evaluate_gates, GateOutcome, GateResult, QualityGate};
pub use pipeline::{StageTrace, StoryOutcome, StoryPipeline};
pub use telemetry::init_tracing;
pub use tools::{
    AiTestOptimizer, ArchitecturePrinciple, DesignPrinciple, DnaAnalysis, DnaComplianceChecker,
    QualityReport, QualityScorer, ScoreResult, StoryAnalyzer, StoryBreakdown, TestPlan,
};
pub use validator::{ContractValidator, ValidationReport, REQUIRED_TOP_LEVEL_KEYS};

/// StoryPipe version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
