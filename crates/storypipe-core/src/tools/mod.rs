//! Per-stage scoring tools.
//!
//! All tools share the [`score::ScoreResult`] shape: keyword counting,
//! fixed break points, threshold comparison. Each agent owns its tools
//! and awaits them strictly in sequence.

pub mod dna;
pub mod quality;
pub mod score;
pub mod story;
pub mod test_opt;

pub use dna::{
    ArchitecturePrinciple, DesignPrinciple, DnaAnalysis, DnaComplianceChecker,
    ARCHITECTURE_BASELINE, ARCHITECTURE_PENALTY, TIME_CEILING_MINUTES,
};
pub use quality::{QualityDimensionScore, QualityReport, QualityScorer, BLOCKING_FLOOR};
pub use score::{clamp_score, round1, KeywordBucket, ScoreResult};
pub use story::{StoryAnalyzer, StoryBreakdown};
pub use test_opt::{AiTestOptimizer, TestPlan};
