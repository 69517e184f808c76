//! Test plan optimization — the test engineer's tool.
//!
//! Unlike the other stages, the test engineer's thresholds are fatal:
//! a coverage, performance, or security shortfall raises a quality gate
//! error instead of being folded into a report. The stage refuses to
//! hand a known-bad implementation forward.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};
use crate::domain::payload::TestAssignment;
use crate::tools::score::round1;

/// Red flags the security scan looks for in implementation notes.
const SECURITY_FLAGS: &[&str] = &[
    "eval(",
    "innerhtml",
    "hardcoded password",
    "hardcoded credential",
    "plaintext secret",
    "http://",
];

/// The optimized test plan the engineer hands to QA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    pub test_files: Vec<String>,
    pub coverage_percent: f64,
    pub response_time_ms: u64,
    pub security_findings: Vec<String>,
}

/// AI test optimizer.
#[derive(Debug, Clone, Copy)]
pub struct AiTestOptimizer {
    pub min_coverage_percent: f64,
    pub performance_budget_ms: u64,
}

impl AiTestOptimizer {
    pub fn new(min_coverage_percent: f64, performance_budget_ms: u64) -> Self {
        Self {
            min_coverage_percent,
            performance_budget_ms,
        }
    }

    /// Coverage estimate from the test-to-source file ratio.
    ///
    /// One test file per source file estimates at 95%; a surplus adds a
    /// point per extra file up to 98%.
    pub fn estimate_coverage(&self, implemented_files: &[String], test_files: &[String]) -> f64 {
        if implemented_files.is_empty() {
            return 0.0;
        }
        let sources = implemented_files.len() as f64;
        let tests = test_files.len() as f64;
        if tests >= sources {
            (95.0 + (tests - sources)).min(98.0)
        } else {
            round1(tests / sources * 95.0)
        }
    }

    /// Response-time estimate: a fixed dispatch cost plus a per-endpoint
    /// charge.
    pub fn estimate_response_time(&self, api_endpoints: &[String]) -> u64 {
        40 + 15 * api_endpoints.len() as u64
    }

    /// Scan free text for security red flags.
    pub fn scan_security(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        SECURITY_FLAGS
            .iter()
            .filter(|flag| haystack.contains(*flag))
            .map(|flag| format!("security red flag in implementation notes: {flag}"))
            .collect()
    }

    /// Build the test plan, raising a fatal quality gate error on any
    /// coverage, performance, or security shortfall.
    pub fn build_plan(&self, story_id: &str, assignment: &TestAssignment) -> Result<TestPlan> {
        let coverage_percent =
            self.estimate_coverage(&assignment.implemented_files, &assignment.test_files);
        if coverage_percent < self.min_coverage_percent {
            return Err(PipelineError::QualityGate {
                story_id: story_id.to_string(),
                gate: "test_coverage_adequate".to_string(),
                detail: format!(
                    "coverage {coverage_percent}% below minimum {}%",
                    self.min_coverage_percent
                ),
            });
        }

        let response_time_ms = self.estimate_response_time(&assignment.api_endpoints);
        if response_time_ms > self.performance_budget_ms {
            return Err(PipelineError::QualityGate {
                story_id: story_id.to_string(),
                gate: "performance_budget_met".to_string(),
                detail: format!(
                    "estimated response time {response_time_ms}ms over budget {}ms",
                    self.performance_budget_ms
                ),
            });
        }

        let security_findings = self.scan_security(&assignment.implementation_notes);
        if !security_findings.is_empty() {
            return Err(PipelineError::QualityGate {
                story_id: story_id.to_string(),
                gate: "security_scan_clean".to_string(),
                detail: security_findings.join("; "),
            });
        }

        let mut test_files = assignment.test_files.clone();
        let e2e_spec = format!("tests/e2e/{story_id}.spec.ts");
        if !test_files.contains(&e2e_spec) {
            test_files.push(e2e_spec);
        }

        Ok(TestPlan {
            test_files,
            coverage_percent,
            response_time_ms,
            security_findings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment() -> TestAssignment {
        TestAssignment {
            implemented_files: vec![
                "frontend/components/story-1.tsx".to_string(),
                "backend/endpoints/story-1.py".to_string(),
            ],
            test_files: vec![
                "tests/frontend/story-1.test.tsx".to_string(),
                "tests/backend/test_story-1.py".to_string(),
            ],
            api_endpoints: vec!["/api/story-1".to_string()],
            acceptance_criteria: vec!["player can sort invoices".to_string()],
            implementation_notes: "stateless endpoint behind the api gateway".to_string(),
        }
    }

    #[test]
    fn test_balanced_files_estimate_95() {
        let optimizer = AiTestOptimizer::new(90.0, 200);
        let a = assignment();
        assert_eq!(
            optimizer.estimate_coverage(&a.implemented_files, &a.test_files),
            95.0
        );
    }

    #[test]
    fn test_missing_tests_drop_coverage_proportionally() {
        let optimizer = AiTestOptimizer::new(90.0, 200);
        let coverage = optimizer.estimate_coverage(
            &["a".to_string(), "b".to_string()],
            &["t".to_string()],
        );
        assert_eq!(coverage, 47.5);
    }

    #[test]
    fn test_build_plan_appends_e2e_spec() {
        let optimizer = AiTestOptimizer::new(90.0, 200);
        let plan = optimizer.build_plan("story-1", &assignment()).unwrap();
        assert_eq!(plan.coverage_percent, 95.0);
        assert_eq!(plan.response_time_ms, 55);
        assert!(plan.security_findings.is_empty());
        assert!(plan
            .test_files
            .contains(&"tests/e2e/story-1.spec.ts".to_string()));
    }

    #[test]
    fn test_low_coverage_raises_fatal_gate_error() {
        let optimizer = AiTestOptimizer::new(90.0, 200);
        let mut a = assignment();
        a.test_files.clear();
        let err = optimizer.build_plan("story-1", &a).unwrap_err();
        match err {
            PipelineError::QualityGate { story_id, gate, .. } => {
                assert_eq!(story_id, "story-1");
                assert_eq!(gate, "test_coverage_adequate");
            }
            other => panic!("expected QualityGate, got {other:?}"),
        }
    }

    #[test]
    fn test_endpoint_explosion_breaks_performance_budget() {
        let optimizer = AiTestOptimizer::new(90.0, 200);
        let mut a = assignment();
        a.api_endpoints = (0..12).map(|i| format!("/api/story-1/{i}")).collect();
        let err = optimizer.build_plan("story-1", &a).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::QualityGate { ref gate, .. } if gate == "performance_budget_met"
        ));
    }

    #[test]
    fn test_security_red_flags_are_fatal() {
        let optimizer = AiTestOptimizer::new(90.0, 200);
        let mut a = assignment();
        a.implementation_notes =
            "quick fix: hardcoded password for the demo account".to_string();
        let err = optimizer.build_plan("story-1", &a).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::QualityGate { ref gate, .. } if gate == "security_scan_clean"
        ));
    }
}
