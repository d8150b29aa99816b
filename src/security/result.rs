//! Validation output types.

use serde::Serialize;

use super::context::ValidationContext;
use super::patterns::{PatternCategory, SecurityPattern, Severity};

/// Coarse summary of the most severe signal in one validation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatLevel {
    /// Nothing rejecting was found
    #[default]
    None,
    /// Weak signal
    Low,
    /// Moderate signal
    Medium,
    /// Strong signal
    High,
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreatLevel::None => write!(f, "NONE"),
            ThreatLevel::Low => write!(f, "LOW"),
            ThreatLevel::Medium => write!(f, "MEDIUM"),
            ThreatLevel::High => write!(f, "HIGH"),
        }
    }
}

/// A rule match that survived confidence adjustment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityViolation {
    /// Rule identifier
    pub pattern_id: String,
    /// Attack family
    pub category: PatternCategory,
    /// Matched text
    pub matched_text: String,
    /// Byte offset of the match in the content
    pub position: usize,
    /// Adjusted confidence (0.5 - 1.0 under the default policy)
    pub confidence: f64,
    /// Rule severity
    pub severity: Severity,
    /// Rule description
    pub description: String,
}

impl SecurityViolation {
    /// Build a violation for a rule match
    pub fn new(
        pattern: &SecurityPattern,
        matched_text: &str,
        position: usize,
        confidence: f64,
    ) -> Self {
        Self {
            pattern_id: pattern.id.to_string(),
            category: pattern.category,
            matched_text: matched_text.to_string(),
            position,
            confidence,
            severity: pattern.severity,
            description: pattern.description.to_string(),
        }
    }
}

/// Verdict for one piece of content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityValidationResult {
    /// Content may be accepted
    pub is_valid: bool,
    /// Threat bucket, NONE whenever the content is valid
    pub threat_level: ThreatLevel,
    /// Violations in rule order, then match order
    pub violations: Vec<SecurityViolation>,
    /// Highest violation confidence, 0.0 when there are none
    pub confidence: f64,
    /// The context supplied by the caller
    pub context: ValidationContext,
    /// Only a leading prefix of the content was scanned
    pub truncated: bool,
    /// Reject threshold of the policy that produced this result
    pub reject_threshold: f64,
}

impl SecurityValidationResult {
    /// Violations at or above `threshold`
    pub fn violations_above(&self, threshold: f64) -> impl Iterator<Item = &SecurityViolation> {
        self.violations
            .iter()
            .filter(move |v| v.confidence >= threshold)
    }

    /// Violations that reject the content on their own
    pub fn high_confidence_violations(&self) -> impl Iterator<Item = &SecurityViolation> {
        self.violations_above(self.reject_threshold)
    }

    /// Violations of one category
    pub fn violations_by_category(
        &self,
        category: PatternCategory,
    ) -> impl Iterator<Item = &SecurityViolation> {
        self.violations
            .iter()
            .filter(move |v| v.category == category)
    }

    /// True if any violation came from the given rule
    pub fn has_pattern(&self, pattern_id: &str) -> bool {
        self.violations.iter().any(|v| v.pattern_id == pattern_id)
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        if self.violations.is_empty() {
            return "valid: no violations".to_string();
        }

        let ids: Vec<&str> = self.violations.iter().map(|v| v.pattern_id.as_str()).collect();
        format!(
            "{}: threat {} confidence {:.2} [{}]",
            if self.is_valid { "valid" } else { "rejected" },
            self.threat_level,
            self.confidence,
            ids.join(", ")
        )
    }
}
