//! Confidence scoring policy and adjustment pipeline.
//!
//! A raw match starts at its rule's minimum confidence. Context-required
//! rules then pass through a fixed sequence of [`Adjustment`] steps, each
//! a pure multiplication by a factor in [0, 1]. Confidence therefore never
//! rises during adjustment, and a higher context score never yields a
//! higher confidence.
//!
//! Every constant lives in [`ScoringPolicy`], versioned so that a change of
//! thresholds or weights is visible in configuration and logs.

use serde::{Deserialize, Serialize};

use super::result::ThreatLevel;
use crate::error::{GuardError, Result};

/// Version tag of the default policy values
pub const POLICY_VERSION: &str = "1";

/// Thresholds and weights used by the analyzer and the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Policy version tag
    pub version: String,

    /// Matches below this confidence are dropped
    pub discard_floor: f64,
    /// Any violation at or above this confidence rejects the content
    pub reject_threshold: f64,
    /// Threat bucket boundary for HIGH
    pub high_threshold: f64,
    /// Threat bucket boundary for MEDIUM
    pub medium_threshold: f64,
    /// Threat bucket boundary for LOW
    pub low_threshold: f64,

    /// Factor applied when a match sits in natural language
    pub natural_language_multiplier: f64,
    /// Characters inspected on each side of a match
    pub context_window: usize,

    /// FREE_TEXT and LONG_FORM_MESSAGE contribution
    pub lenient_content_weight: f64,
    /// STRUCTURED contribution
    pub strict_content_weight: f64,
    /// URL and FILE_PATH contribution
    pub locator_content_weight: f64,
    /// Contribution when text is longer than `long_text_chars`
    pub long_text_weight: f64,
    /// Length threshold for `long_text_weight`
    pub long_text_chars: usize,
    /// Additional contribution above `very_long_text_chars`
    pub very_long_text_weight: f64,
    /// Length threshold for `very_long_text_weight`
    pub very_long_text_chars: usize,
    /// Contribution when there are more than `min_sentence_groups` sentence groups
    pub sentence_weight: f64,
    /// Sentence group count that must be exceeded
    pub min_sentence_groups: usize,
    /// Contribution when the stop-word share exceeds `stop_word_ratio`
    pub stop_word_weight: f64,
    /// Stop-word share that must be exceeded
    pub stop_word_ratio: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            discard_floor: 0.5,
            reject_threshold: 0.8,
            high_threshold: 0.9,
            medium_threshold: 0.7,
            low_threshold: 0.5,
            natural_language_multiplier: 0.5,
            context_window: 50,
            lenient_content_weight: 0.3,
            strict_content_weight: -0.2,
            locator_content_weight: 0.1,
            long_text_weight: 0.1,
            long_text_chars: 100,
            very_long_text_weight: 0.1,
            very_long_text_chars: 500,
            sentence_weight: 0.2,
            min_sentence_groups: 2,
            stop_word_weight: 0.2,
            stop_word_ratio: 0.1,
        }
    }
}

impl ScoringPolicy {
    /// Check that every value is usable.
    ///
    /// Probabilities must lie in [0, 1], buckets must be ordered
    /// `low <= medium <= high` and the context window must be non-zero.
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("discard_floor", self.discard_floor),
            ("reject_threshold", self.reject_threshold),
            ("high_threshold", self.high_threshold),
            ("medium_threshold", self.medium_threshold),
            ("low_threshold", self.low_threshold),
            ("natural_language_multiplier", self.natural_language_multiplier),
            ("stop_word_ratio", self.stop_word_ratio),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(GuardError::Config(format!(
                    "policy.{name} = {value} is outside [0, 1]"
                )));
            }
        }

        let weights = [
            ("lenient_content_weight", self.lenient_content_weight),
            ("strict_content_weight", self.strict_content_weight),
            ("locator_content_weight", self.locator_content_weight),
            ("long_text_weight", self.long_text_weight),
            ("very_long_text_weight", self.very_long_text_weight),
            ("sentence_weight", self.sentence_weight),
            ("stop_word_weight", self.stop_word_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                return Err(GuardError::Config(format!("policy.{name} is not finite")));
            }
        }

        if !(self.low_threshold <= self.medium_threshold
            && self.medium_threshold <= self.high_threshold)
        {
            return Err(GuardError::Config(format!(
                "threat thresholds out of order: low {} / medium {} / high {}",
                self.low_threshold, self.medium_threshold, self.high_threshold
            )));
        }

        if self.context_window == 0 {
            return Err(GuardError::Config(
                "policy.context_window must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Threat bucket for a single confidence
    pub fn bucket(&self, confidence: f64) -> ThreatLevel {
        if confidence >= self.high_threshold {
            ThreatLevel::High
        } else if confidence >= self.medium_threshold {
            ThreatLevel::Medium
        } else if confidence >= self.low_threshold {
            ThreatLevel::Low
        } else {
            ThreatLevel::None
        }
    }

    /// Fold one more confidence into a running threat level.
    ///
    /// Levels only move upward; HIGH absorbs everything after it.
    pub fn fold_threat(&self, current: ThreatLevel, confidence: f64) -> ThreatLevel {
        current.max(self.bucket(confidence))
    }

    /// True if the confidence survives the discard floor
    pub fn is_reportable(&self, confidence: f64) -> bool {
        confidence >= self.discard_floor
    }

    /// True if the confidence rejects the content on its own
    pub fn is_rejecting(&self, confidence: f64) -> bool {
        confidence >= self.reject_threshold
    }
}

/// One confidence adjustment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Halve (by default) when the match sits inside prose
    NaturalLanguage {
        /// Analyzer verdict for the match surroundings
        natural: bool,
    },
    /// Scale by `1 - score` for the content-level leniency score
    ContextScore {
        /// Score in [0, 1]
        score: f64,
    },
}

impl Adjustment {
    /// Apply this step to a confidence
    pub fn apply(&self, confidence: f64, policy: &ScoringPolicy) -> f64 {
        match *self {
            Adjustment::NaturalLanguage { natural: true } => {
                confidence * policy.natural_language_multiplier
            },
            Adjustment::NaturalLanguage { natural: false } => confidence,
            Adjustment::ContextScore { score } => confidence * (1.0 - score.clamp(0.0, 1.0)),
        }
    }
}

/// Run a base confidence through the steps in order, clamped to [0, 1]
pub fn adjust_confidence(base: f64, steps: &[Adjustment], policy: &ScoringPolicy) -> f64 {
    steps
        .iter()
        .fold(base, |confidence, step| step.apply(confidence, policy))
        .clamp(0.0, 1.0)
}
