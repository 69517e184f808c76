//! Domain model: stages, contracts, payloads and the error taxonomy.

pub mod contract;
pub mod error;
pub mod payload;
pub mod stage;

pub use contract::{
    ArchitecturePrinciples, Contract, DesignPrinciples, DnaCompliance, InputRequirements,
    OutputSpecifications, ARCHITECTURE_PRINCIPLE_KEYS, CONTRACT_VERSION, DESIGN_PRINCIPLE_KEYS,
};
pub use error::{PipelineError, Result};
pub use payload::{
    Complexity, DesignBrief, DesignHandoff, FeatureRequest, GameDesign, ImplementationOrder,
    QaAssignment, ReviewDossier, ReworkOrder, StagePayload, TestAssignment,
};
pub use stage::{AgentId, PIPELINE_EDGES};
