//! Shared scoring vocabulary for all stage tools.
//!
//! Every tool reduces its input to a [`ScoreResult`]: a 0-100 score, a
//! compliance boolean from a fixed threshold, and the evidence/issues
//! that explain the number. Scoring is pure — the same input always
//! produces the same result.

use serde::{Deserialize, Serialize};

/// The result of scoring one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0-100, clamped.
    pub score: f64,
    /// Whether the score clears the dimension's threshold.
    pub compliant: bool,
    /// What contributed to the score.
    pub evidence: Vec<String>,
    /// What detracted from it.
    pub issues: Vec<String>,
    /// A single actionable next step.
    pub recommendation: String,
}

impl ScoreResult {
    /// Assemble a result from accumulated partials against a threshold.
    pub fn from_parts(
        raw_score: f64,
        threshold: f64,
        evidence: Vec<String>,
        issues: Vec<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        let score = clamp_score(raw_score);
        Self {
            score,
            compliant: score >= threshold,
            evidence,
            issues,
            recommendation: recommendation.into(),
        }
    }
}

/// A named list of keywords with break points mapping the number of
/// distinct matched keywords to a partial score.
///
/// Break points must be ordered by descending match count; the first one
/// whose count is met wins.
#[derive(Debug, Clone, Copy)]
pub struct KeywordBucket {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub breakpoints: &'static [(usize, f64)],
}

impl KeywordBucket {
    /// Count distinct keywords present in `text`, case-insensitively.
    pub fn match_count(&self, text: &str) -> usize {
        self.matches(text).len()
    }

    /// The distinct keywords present in `text`, case-insensitively.
    pub fn matches(&self, text: &str) -> Vec<&'static str> {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .copied()
            .filter(|kw| haystack.contains(kw))
            .collect()
    }

    /// Score this bucket against `text`, recording evidence or an issue
    /// on the way.
    pub fn score(&self, text: &str, evidence: &mut Vec<String>, issues: &mut Vec<String>) -> f64 {
        let matched = self.matches(text);
        let partial = self
            .breakpoints
            .iter()
            .find(|(count, _)| matched.len() >= *count)
            .map(|(_, partial)| *partial)
            .unwrap_or(0.0);

        if matched.is_empty() {
            issues.push(format!("no {} signals found", self.name));
        } else {
            evidence.push(format!(
                "{} signals matched: {}",
                self.name,
                matched.join(", ")
            ));
        }
        partial
    }
}

/// Clamp to the 0-100 scoring range.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Round to one decimal place (the precision every aggregate reports).
pub fn round1(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}
