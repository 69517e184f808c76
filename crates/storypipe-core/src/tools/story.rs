//! Story analysis — the project manager's breakdown tool.
//!
//! Turns a free-text feature request into the structured story metadata
//! the designer needs: complexity band, effort estimate, and acceptance
//! criteria pulled from bullet lines or must/should sentences.

use serde::{Deserialize, Serialize};

use crate::domain::payload::{Complexity, FeatureRequest};

/// Keywords that push a story toward a higher complexity band.
const COMPLEXITY_KEYWORDS: &[&str] = &[
    "integration",
    "multiplayer",
    "realtime",
    "real-time",
    "persistence",
    "synchroni",
    "migration",
];

/// Structured breakdown of one feature request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBreakdown {
    pub story_id: String,
    pub complexity: Complexity,
    pub estimated_effort_hours: f64,
    pub acceptance_criteria: Vec<String>,
}

/// Story analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoryAnalyzer;

impl StoryAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Break a feature request down. Pure and deterministic.
    pub fn analyze(&self, story_id: &str, feature: &FeatureRequest) -> StoryBreakdown {
        let complexity = self.assess_complexity(&feature.feature_description);
        let acceptance_criteria = self.extract_acceptance_criteria(&feature.feature_description);

        let multiplier = match complexity {
            Complexity::Low => 1.0,
            Complexity::Medium => 2.0,
            Complexity::High => 3.5,
        };
        let estimated_effort_hours =
            4.0 * multiplier + 0.5 * acceptance_criteria.len() as f64;

        StoryBreakdown {
            story_id: story_id.to_string(),
            complexity,
            estimated_effort_hours,
            acceptance_criteria,
        }
    }

    fn assess_complexity(&self, description: &str) -> Complexity {
        let haystack = description.to_lowercase();
        let keyword_hits = COMPLEXITY_KEYWORDS
            .iter()
            .filter(|kw| haystack.contains(*kw))
            .count();
        let words = description.split_whitespace().count();

        if keyword_hits >= 2 || words > 120 {
            Complexity::High
        } else if keyword_hits == 1 || words > 60 {
            Complexity::Medium
        } else {
            Complexity::Low
        }
    }

    /// Bullet lines win; otherwise must/should sentences; otherwise a
    /// single catch-all criterion so the breakdown is never empty.
    fn extract_acceptance_criteria(&self, description: &str) -> Vec<String> {
        let bullets: Vec<String> = description
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("- ") || line.starts_with("* "))
            .map(|line| line[2..].trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        if !bullets.is_empty() {
            return bullets;
        }

        let sentences: Vec<String> = description
            .split('.')
            .map(str::trim)
            .filter(|s| {
                let lower = s.to_lowercase();
                !s.is_empty() && (lower.contains("must") || lower.contains("should"))
            })
            .map(|s| s.to_string())
            .collect();
        if !sentences.is_empty() {
            return sentences;
        }

        vec!["feature behaves as described in the request".to_string()]
    }
}
