//! Pipeline configuration.
//!
//! Plain serde structs with defaults; the CLI layers TOML on top. The
//! `timeout_secs` knob is declared for interface compatibility but is not
//! enforced by any awaited operation — every tool call here is an
//! in-process computation.

use serde::{Deserialize, Serialize};

/// Numeric thresholds shared by the gate checkers and stage tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageThresholds {
    /// Minimum acceptable test coverage, percent.
    pub min_coverage_percent: f64,
    /// Maximum acceptable API response time, milliseconds.
    pub performance_budget_ms: u64,
    /// Minimum acceptable QA overall score.
    pub qa_min_score: f64,
    /// Minimum weighted decision score for final approval.
    pub approval_threshold: f64,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            min_coverage_percent: 90.0,
            performance_budget_ms: 200,
            qa_min_score: 80.0,
            approval_threshold: 90.0,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How many reviewer-triggered rework cycles to run before giving up.
    pub max_rework_cycles: u32,
    /// Declared per-stage timeout. Not enforced — see module docs.
    pub timeout_secs: u64,
    pub thresholds: StageThresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_rework_cycles: 1,
            timeout_secs: 300,
            thresholds: StageThresholds::default(),
        }
    }
}
