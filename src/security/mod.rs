//! Context-aware injection detection.
//!
//! This module decides whether a piece of untrusted text is safe to accept,
//! given the role the text plays (search query, review, announcement...).
//! Free text that merely mentions SQL words is accepted while structural
//! attack payloads are rejected.
//!
//! # Pipeline
//!
//! ```text
//! content + context -> pattern scan -> per-match adjustment -> fold -> result
//! ```
//!
//! 1. Every rule of the [`PatternRegistry`] runs over the content.
//! 2. Signature rules keep their baseline confidence.
//! 3. Context-required rules are halved when the match sits in prose and
//!    scaled by `1 - score`, where `score` is the content-level leniency
//!    from [`ContextAnalyzer::analyze_content_context`].
//! 4. Matches below the discard floor (0.5) vanish.
//! 5. Any surviving violation at 0.8 or above rejects the content.
//!
//! # Rule Catalog
//!
//! | Rule                  | Category          | Confidence | Context |
//! |-----------------------|-------------------|------------|---------|
//! | `union_attack`        | SQL injection     | 0.95       | no      |
//! | `comment_injection`   | SQL injection     | 0.90       | no      |
//! | `time_based_attack`   | SQL injection     | 0.95       | no      |
//! | `stacked_queries`     | SQL injection     | 0.90       | no      |
//! | `classic_injection`   | SQL injection     | 0.85       | yes     |
//! | `boolean_tautology`   | SQL injection     | 0.80       | yes     |
//! | `quote_manipulation`  | SQL injection     | 0.70       | yes     |
//! | `sql_keywords`        | SQL injection     | 0.60       | yes     |
//! | `script_tag`          | XSS               | 0.95       | no      |
//! | `event_handler`       | XSS               | 0.90       | no      |
//! | `javascript_uri`      | XSS               | 0.90       | no      |
//! | `javascript_scheme`   | XSS               | 0.85       | yes     |
//! | `shell_payload`       | Command injection | 0.90       | no      |
//! | `shell_chain`         | Command injection | 0.85       | yes     |
//! | `command_substitution`| Command injection | 0.85       | yes     |
//!
//! # Usage
//!
//! ```rust
//! use ctxguard::security::{validate_content, ContentType, ValidationContext};
//!
//! let announcement = ValidationContext::new(ContentType::LongFormMessage);
//! let result = validate_content("Thank you all for your ongoing support.", &announcement);
//! assert!(result.is_valid);
//!
//! let query = ValidationContext::new(ContentType::Structured);
//! let result = validate_content("UNION SELECT * FROM users", &query);
//! assert!(!result.is_valid);
//! ```

mod context;
mod engine;
mod patterns;
mod result;
mod scoring;

pub use context::{
    analyze_content_context, is_natural_language_context, is_structured_data, ContentType,
    ContextAnalyzer, ValidationContext, STOP_WORDS,
};
pub use engine::{is_content_safe, validate_content, DetectionEngine};
pub use patterns::{
    MatchLimit, Matcher, PatternCategory, PatternDefinition, PatternMatch, PatternRegistry,
    SecurityPattern, Severity, COMMAND_INJECTION_PATTERNS, SQL_INJECTION_PATTERNS, XSS_PATTERNS,
};
pub use result::{SecurityValidationResult, SecurityViolation, ThreatLevel};
pub use scoring::{adjust_confidence, Adjustment, ScoringPolicy, POLICY_VERSION};
