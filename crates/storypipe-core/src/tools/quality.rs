//! Quality scoring — the QA tester's tool.
//!
//! Folds the test engineer's measurements into weighted quality
//! dimensions and an overall score. Shortfalls here are reported, not
//! raised: QA's job is the dossier the reviewer decides on, so blocking
//! issues ride along in the report instead of aborting the stage.

use serde::{Deserialize, Serialize};

use crate::config::StageThresholds;
use crate::domain::payload::QaAssignment;
use crate::tools::score::{clamp_score, round1};

/// Any dimension scoring below this floor becomes a blocking issue.
pub const BLOCKING_FLOOR: f64 = 50.0;

/// One weighted quality dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityDimensionScore {
    pub dimension: String,
    pub weight: f64,
    pub score: f64,
}

/// The QA report handed to the quality reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_score: f64,
    pub dimensions: Vec<QualityDimensionScore>,
    pub blocking_issues: Vec<String>,
    pub deployment_ready: bool,
}

/// Weighted quality scorer.
#[derive(Debug, Clone, Copy)]
pub struct QualityScorer {
    min_coverage_percent: f64,
    performance_budget_ms: u64,
    qa_min_score: f64,
}

impl QualityScorer {
    pub fn new(thresholds: &StageThresholds) -> Self {
        Self {
            min_coverage_percent: thresholds.min_coverage_percent,
            performance_budget_ms: thresholds.performance_budget_ms,
            qa_min_score: thresholds.qa_min_score,
        }
    }

    /// Score an assignment. Pure and deterministic.
    pub fn score(&self, assignment: &QaAssignment) -> QualityReport {
        let dimensions = vec![
            QualityDimensionScore {
                dimension: "test_confidence".to_string(),
                weight: 0.35,
                score: clamp_score(assignment.coverage_percent),
            },
            QualityDimensionScore {
                dimension: "responsiveness".to_string(),
                weight: 0.25,
                score: self.responsiveness_score(assignment.response_time_ms),
            },
            QualityDimensionScore {
                dimension: "security".to_string(),
                weight: 0.2,
                score: clamp_score(100.0 - 35.0 * assignment.security_findings.len() as f64),
            },
            QualityDimensionScore {
                dimension: "acceptance_clarity".to_string(),
                weight: 0.2,
                score: clamp_score(40.0 + 15.0 * assignment.acceptance_criteria.len() as f64),
            },
        ];

        let overall_score = round1(
            dimensions
                .iter()
                .map(|d| d.weight * d.score)
                .sum::<f64>(),
        );

        let mut blocking_issues = Vec::new();
        for dim in &dimensions {
            if dim.score < BLOCKING_FLOOR {
                blocking_issues.push(format!(
                    "quality dimension {} scored {}, below the blocking floor",
                    dim.dimension, dim.score
                ));
            }
        }
        for finding in &assignment.security_findings {
            blocking_issues.push(format!("unresolved: {finding}"));
        }
        if assignment.coverage_percent < self.min_coverage_percent {
            blocking_issues.push(format!(
                "coverage {}% below minimum {}%",
                assignment.coverage_percent, self.min_coverage_percent
            ));
        }

        let deployment_ready = blocking_issues.is_empty() && overall_score >= self.qa_min_score;

        QualityReport {
            overall_score,
            dimensions,
            blocking_issues,
            deployment_ready,
        }
    }

    /// 100 at zero latency, gently degrading to 70 at the budget, then
    /// steeply past it.
    fn responsiveness_score(&self, response_time_ms: u64) -> f64 {
        let ratio = response_time_ms as f64 / self.performance_budget_ms as f64;
        if ratio <= 1.0 {
            clamp_score(100.0 - 30.0 * ratio)
        } else {
            clamp_score(70.0 - 50.0 * (ratio - 1.0))
        }
    }
}
