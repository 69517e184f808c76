//! Pipeline stage vocabulary: `AgentId` and the handoff graph.
//!
//! The permitted `(source, target)` pairs live in one place —
//! [`PIPELINE_EDGES`] — and every validator and agent consults it through
//! [`AgentId::allows_handoff`]. The pipeline is a linear chain with a
//! single branch point: the quality reviewer routes to deployment on
//! approval or back to the developer for rework.

use serde::{Deserialize, Serialize};

/// The seven agent identities that appear in contracts.
///
/// `Deployment` is a terminal target only; it never produces a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    ProjectManager,
    GameDesigner,
    Developer,
    TestEngineer,
    QaTester,
    QualityReviewer,
    Deployment,
}

/// Every permitted handoff in the pipeline.
///
/// `QualityReviewer -> Developer` is the rework loop — the only cycle.
pub const PIPELINE_EDGES: &[(AgentId, AgentId)] = &[
    (AgentId::ProjectManager, AgentId::GameDesigner),
    (AgentId::GameDesigner, AgentId::Developer),
    (AgentId::Developer, AgentId::TestEngineer),
    (AgentId::TestEngineer, AgentId::QaTester),
    (AgentId::QaTester, AgentId::QualityReviewer),
    (AgentId::QualityReviewer, AgentId::Deployment),
    (AgentId::QualityReviewer, AgentId::Developer),
];

impl AgentId {
    /// The wire string for this agent (matches serde's snake_case form).
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::ProjectManager => "project_manager",
            AgentId::GameDesigner => "game_designer",
            AgentId::Developer => "developer",
            AgentId::TestEngineer => "test_engineer",
            AgentId::QaTester => "qa_tester",
            AgentId::QualityReviewer => "quality_reviewer",
            AgentId::Deployment => "deployment",
        }
    }

    /// Parse a wire string. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "project_manager" => Some(AgentId::ProjectManager),
            "game_designer" => Some(AgentId::GameDesigner),
            "developer" => Some(AgentId::Developer),
            "test_engineer" => Some(AgentId::TestEngineer),
            "qa_tester" => Some(AgentId::QaTester),
            "quality_reviewer" => Some(AgentId::QualityReviewer),
            "deployment" => Some(AgentId::Deployment),
            _ => None,
        }
    }

    /// Whether this agent may hand a contract to `target`.
    pub fn allows_handoff(&self, target: AgentId) -> bool {
        PIPELINE_EDGES
            .iter()
            .any(|(from, to)| *from == *self && *to == target)
    }

    /// All targets this agent may hand off to, in edge-table order.
    pub fn successors(&self) -> Vec<AgentId> {
        PIPELINE_EDGES
            .iter()
            .filter(|(from, _)| from == self)
            .map(|(_, to)| *to)
            .collect()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_chain_edges_allowed() {
        assert!(AgentId::ProjectManager.allows_handoff(AgentId::GameDesigner));
        assert!(AgentId::GameDesigner.allows_handoff(AgentId::Developer));
        assert!(AgentId::Developer.allows_handoff(AgentId::TestEngineer));
        assert!(AgentId::TestEngineer.allows_handoff(AgentId::QaTester));
        assert!(AgentId::QaTester.allows_handoff(AgentId::QualityReviewer));
    }

    #[test]
    fn test_reviewer_branches_to_deployment_or_developer() {
        let successors = AgentId::QualityReviewer.successors();
        assert_eq!(successors, vec![AgentId::Deployment, AgentId::Developer]);
    }

    #[test]
    fn test_reverse_and_skip_edges_rejected() {
        assert!(!AgentId::GameDesigner.allows_handoff(AgentId::ProjectManager));
        assert!(!AgentId::ProjectManager.allows_handoff(AgentId::Developer));
        assert!(!AgentId::Developer.allows_handoff(AgentId::QaTester));
        assert!(!AgentId::Deployment.allows_handoff(AgentId::ProjectManager));
    }

    #[test]
    fn test_wire_strings_round_trip() {
        for (from, to) in PIPELINE_EDGES {
            assert_eq!(AgentId::parse(from.as_str()), Some(*from));
            assert_eq!(AgentId::parse(to.as_str()), Some(*to));
        }
        assert_eq!(AgentId::parse("release_manager"), None);
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&AgentId::QaTester).unwrap();
        assert_eq!(json, "\"qa_tester\"");
        let back: AgentId = serde_json::from_str("\"quality_reviewer\"").unwrap();
        assert_eq!(back, AgentId::QualityReviewer);
    }
}
