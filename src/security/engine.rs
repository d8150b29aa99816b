//! Detection engine.
//!
//! Runs every rule of a [`PatternRegistry`] over the content, attenuates
//! context-required matches, drops whatever falls under the discard floor
//! and folds the rest into a [`SecurityValidationResult`].
//!
//! The engine holds no mutable state. One instance can be shared across
//! threads and called concurrently without locks.

use std::sync::Arc;

use lazy_static::lazy_static;

use super::context::{ContextAnalyzer, ValidationContext};
use super::patterns::{PatternRegistry, SecurityPattern};
use super::result::{SecurityValidationResult, SecurityViolation, ThreatLevel};
use super::scoring::{adjust_confidence, Adjustment, ScoringPolicy};
use crate::config::EngineConfig;
use crate::error::Result;

lazy_static! {
    static ref DEFAULT_ENGINE: DetectionEngine = DetectionEngine::new();
}

/// Context-aware injection detector
#[derive(Debug, Clone)]
pub struct DetectionEngine {
    registry: Arc<PatternRegistry>,
    analyzer: ContextAnalyzer,
    /// Scan at most this many leading characters
    max_content_chars: Option<usize>,
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self {
            registry: PatternRegistry::shared(),
            analyzer: ContextAnalyzer::default(),
            max_content_chars: None,
        }
    }
}

impl DetectionEngine {
    /// Engine with the built-in rules and the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared default engine
    pub fn global() -> &'static Self {
        &DEFAULT_ENGINE
    }

    /// Build an engine from configuration, validating the policy
    pub fn from_config(config: &EngineConfig, policy: ScoringPolicy) -> Result<Self> {
        let engine = Self::new().with_policy(policy)?;
        Ok(match config.max_content_chars {
            Some(limit) => engine.with_max_content_chars(limit),
            None => engine,
        })
    }

    /// Replace the scoring policy.
    ///
    /// Fails if the policy does not validate.
    pub fn with_policy(mut self, policy: ScoringPolicy) -> Result<Self> {
        policy.validate()?;
        tracing::info!(version = %policy.version, "Using scoring policy");
        self.analyzer = ContextAnalyzer::new(policy);
        Ok(self)
    }

    /// Use a different rule registry
    pub fn with_registry(mut self, registry: impl Into<Arc<PatternRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    /// Only scan the first `limit` characters of each content item
    pub fn with_max_content_chars(mut self, limit: usize) -> Self {
        self.max_content_chars = Some(limit);
        self
    }

    /// Rule registry in use
    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Scoring policy in use
    pub fn policy(&self) -> &ScoringPolicy {
        self.analyzer.policy()
    }

    /// Validate one content item.
    ///
    /// Never fails: every input yields a result. Identical inputs give
    /// identical results, violations ordered by rule then by position.
    pub fn validate_content(
        &self,
        content: &str,
        context: &ValidationContext,
    ) -> SecurityValidationResult {
        let policy = self.policy();
        let (scanned, truncated) = self.scan_window(content);

        // Depends only on the content and context, so it is shared by all matches.
        let mut context_score: Option<f64> = None;

        let mut violations = Vec::new();
        let mut threat_level = ThreatLevel::None;
        let mut max_confidence = 0.0f64;

        for pattern in self.registry.iter() {
            for found in pattern.find_all(scanned) {
                let confidence = if pattern.context_required {
                    let score = *context_score.get_or_insert_with(|| {
                        self.analyzer.analyze_content_context(scanned, context)
                    });
                    self.attenuate(pattern, scanned, found.offset, found.len(), score)
                } else {
                    pattern.minimum_confidence
                };

                if !policy.is_reportable(confidence) {
                    tracing::trace!(
                        pattern_id = pattern.id,
                        position = found.offset,
                        confidence,
                        "Match below discard floor"
                    );
                    continue;
                }

                tracing::debug!(
                    pattern_id = pattern.id,
                    position = found.offset,
                    confidence,
                    "Security pattern matched"
                );

                threat_level = policy.fold_threat(threat_level, confidence);
                max_confidence = max_confidence.max(confidence);
                violations.push(SecurityViolation::new(
                    pattern,
                    found.text,
                    found.offset,
                    confidence,
                ));
            }
        }

        let is_valid = !violations.iter().any(|v| policy.is_rejecting(v.confidence));

        let result = SecurityValidationResult {
            is_valid,
            threat_level: if is_valid { ThreatLevel::None } else { threat_level },
            violations,
            confidence: max_confidence,
            context: context.clone(),
            truncated,
            reject_threshold: policy.reject_threshold,
        };

        tracing::debug!(
            valid = result.is_valid,
            threat_level = %result.threat_level,
            violations = result.violations.len(),
            content_type = %context.content_type,
            "Content validated"
        );

        result
    }

    /// Convenience wrapper returning only the verdict
    pub fn is_content_safe(&self, content: &str, context: &ValidationContext) -> bool {
        self.validate_content(content, context).is_valid
    }

    /// Adjusted confidence of one context-required match
    pub fn attenuate(
        &self,
        pattern: &SecurityPattern,
        content: &str,
        offset: usize,
        len: usize,
        context_score: f64,
    ) -> f64 {
        if !pattern.context_required {
            return pattern.minimum_confidence;
        }

        let natural = self
            .analyzer
            .is_natural_language_context(content, offset, len);
        let steps = [
            Adjustment::NaturalLanguage { natural },
            Adjustment::ContextScore {
                score: context_score,
            },
        ];
        adjust_confidence(pattern.minimum_confidence, &steps, self.policy())
    }

    fn scan_window<'c>(&self, content: &'c str) -> (&'c str, bool) {
        match self.max_content_chars {
            Some(limit) => match content.char_indices().nth(limit) {
                Some((cut, _)) => (&content[..cut], true),
                None => (content, false),
            },
            None => (content, false),
        }
    }
}

/// Validate content with the shared default engine
pub fn validate_content(content: &str, context: &ValidationContext) -> SecurityValidationResult {
    DetectionEngine::global().validate_content(content, context)
}

/// True if the shared default engine accepts the content
pub fn is_content_safe(content: &str, context: &ValidationContext) -> bool {
    DetectionEngine::global().is_content_safe(content, context)
}
