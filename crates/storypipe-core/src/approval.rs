//! Final approval decision — the quality reviewer's branch point.
//!
//! The only place the pipeline forks: approved stories route to
//! deployment, rejected ones back to the developer. A non-empty blocking
//! issue list is a hard veto — no score can override it.

use serde::{Deserialize, Serialize};

use crate::domain::stage::AgentId;
use crate::tools::score::round1;

/// Weighted inputs to the approval decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub story_id: String,
    /// QA's overall quality score.
    pub quality_score: f64,
    /// Readiness of the deployment path (artifacts, criteria met).
    pub deployment_readiness: f64,
    /// 100 minus penalties for critical issues found in review.
    pub critical_issue_score: f64,
    /// Aggregate DNA compliance carried by the contract.
    pub dna_compliance_score: f64,
    /// Hard-veto list; any entry forces rejection.
    pub blocking_issues: Vec<String>,
}

/// The reviewer's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub decision_score: f64,
    /// `deployment` when approved, `developer` when rejected.
    pub target: AgentId,
    pub rationale: Vec<String>,
}

/// Final approver.
#[derive(Debug, Clone, Copy)]
pub struct FinalApprover {
    pub approval_threshold: f64,
}

impl Default for FinalApprover {
    fn default() -> Self {
        Self {
            approval_threshold: 90.0,
        }
    }
}

impl FinalApprover {
    pub fn new(approval_threshold: f64) -> Self {
        Self { approval_threshold }
    }

    /// Decide approval.
    ///
    /// Decision score weights: quality 40%, deployment readiness 30%,
    /// critical issues 20%, DNA compliance 10%. Blocking issues veto
    /// regardless of the score.
    pub fn make_approval_decision(&self, review: &ReviewSummary) -> ApprovalDecision {
        let decision_score = round1(
            0.4 * review.quality_score
                + 0.3 * review.deployment_readiness
                + 0.2 * review.critical_issue_score
                + 0.1 * review.dna_compliance_score,
        );

        let mut rationale = vec![format!(
            "decision score {decision_score} against threshold {}",
            self.approval_threshold
        )];

        let approved = if review.blocking_issues.is_empty() {
            decision_score >= self.approval_threshold
        } else {
            rationale.push(format!(
                "{} blocking issue(s) veto approval",
                review.blocking_issues.len()
            ));
            rationale.extend(review.blocking_issues.iter().cloned());
            false
        };

        if approved {
            rationale.push("routing to deployment".to_string());
        } else {
            rationale.push("routing back to developer for rework".to_string());
        }

        ApprovalDecision {
            approved,
            decision_score,
            target: if approved {
                AgentId::Deployment
            } else {
                AgentId::Developer
            },
            rationale,
        }
    }
}
