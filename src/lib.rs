//! # ctxguard - Context-Aware Injection Detection
//!
//! Decides whether untrusted text submitted to a web application is safe
//! to accept. Detection combines signature matching, natural-language
//! heuristics and confidence scoring, so that announcements, reviews and
//! descriptions pass while SQL injection, XSS and shell payloads are
//! rejected.
//!
//! ## Features
//!
//! - **Context-aware scoring**: the same match is weighed differently in a
//!   search box than in a long announcement
//! - **Linear-time matching**: rules compile to finite automata, no input
//!   can cause catastrophic backtracking
//! - **Deterministic output**: violations ordered by rule, then position
//! - **Versioned policy**: every threshold and weight is configuration
//!
//! ## Integration
//!
//! A request-validation layer calls the engine once per untrusted field and
//! acts on the verdict:
//!
//! ```text
//!  request field ──> ValidationContext ──> DetectionEngine ──> result
//!                                                                 │
//!                                    is_valid = false ──> reject (400)
//!                                    is_valid = true  ──> accept, log violations
//! ```
//!
//! | Field role              | Content type        |
//! |-------------------------|---------------------|
//! | Search query, filter    | `STRUCTURED`        |
//! | Title, review, comment  | `FREE_TEXT`         |
//! | Link                    | `URL`               |
//! | Upload name             | `FILE_PATH`         |
//! | Announcement, message   | `LONG_FORM_MESSAGE` |
//!
//! ## Quick Start
//!
//! ```rust
//! use ctxguard::{is_content_safe, ContentType, ValidationContext};
//!
//! let review = ValidationContext::new(ContentType::FreeText);
//! assert!(is_content_safe(
//!     "Fresh organic vegetables and 5 different varieties available daily",
//!     &review,
//! ));
//!
//! let search = ValidationContext::new(ContentType::Structured);
//! assert!(!is_content_safe("'; DROP TABLE users; --", &search));
//! ```
//!
//! ## Custom Policy
//!
//! ```rust
//! use ctxguard::{DetectionEngine, ScoringPolicy};
//!
//! let policy = ScoringPolicy {
//!     reject_threshold: 0.85,
//!     ..Default::default()
//! };
//! let engine = DetectionEngine::new().with_policy(policy).unwrap();
//! assert_eq!(engine.policy().reject_threshold, 0.85);
//! ```
//!
//! ## Modules
//!
//! - [`security`]: Pattern registry, context analyzer and detection engine
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod error;
pub mod security;

// Re-exports for convenience
pub use config::{Config, EngineConfig};
pub use error::{GuardError, Result};
pub use security::{
    is_content_safe, validate_content, ContentType, DetectionEngine, PatternRegistry,
    ScoringPolicy, SecurityValidationResult, SecurityViolation, ThreatLevel, ValidationContext,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
