//! Detection rules for injection payloads.
//!
//! Rules are declared as static [`PatternDefinition`] tables and compiled
//! once into a [`PatternRegistry`]. Matching uses the `regex` crate's
//! finite automata, so scan time is linear in the input length for every
//! rule and no input can trigger catastrophic backtracking.
//!
//! Table order is evaluation order. It is part of the output contract:
//! violations are reported in registry order, then match order.

use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{GuardError, Result};

/// Attack family a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternCategory {
    /// SQL injection
    SqlInjection,
    /// Cross-site scripting
    Xss,
    /// Shell command injection
    CommandInjection,
}

impl std::fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternCategory::SqlInjection => write!(f, "SQL_INJECTION"),
            PatternCategory::Xss => write!(f, "XSS"),
            PatternCategory::CommandInjection => write!(f, "COMMAND_INJECTION"),
        }
    }
}

/// Severity of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational
    Low,
    /// Worth reviewing
    Medium,
    /// Likely exploitable
    High,
    /// Direct data loss or takeover
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// How many occurrences a rule reports per input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLimit {
    /// Only the leftmost match
    First,
    /// Every non-overlapping match, left to right
    All,
}

/// Static description of a rule, before compilation
#[derive(Debug, Clone, Copy)]
pub struct PatternDefinition {
    /// Unique identifier
    pub id: &'static str,
    /// Attack family
    pub category: PatternCategory,
    /// Regex source
    pub pattern: &'static str,
    /// Matches must be attenuated by context analysis before being trusted
    pub context_required: bool,
    /// Baseline confidence when triggered (0.0 - 1.0)
    pub minimum_confidence: f64,
    /// Severity
    pub severity: Severity,
    /// Occurrences reported per input
    pub max_matches: MatchLimit,
    /// Human-readable explanation
    pub description: &'static str,
}

/// SQL injection rules.
///
/// Signature rules (`context_required: false`) come first; they are
/// rarely seen in legitimate text and are never softened.
pub static SQL_INJECTION_PATTERNS: &[PatternDefinition] = &[
    PatternDefinition {
        id: "union_attack",
        category: PatternCategory::SqlInjection,
        pattern: r"(?i)\bunion\s+(?:all\s+)?select\b",
        context_required: false,
        minimum_confidence: 0.95,
        severity: Severity::Critical,
        max_matches: MatchLimit::All,
        description: "UNION-based SQL injection",
    },
    PatternDefinition {
        id: "comment_injection",
        category: PatternCategory::SqlInjection,
        pattern: r#"['"]\s*;.*?(?:--|#|/\*)"#,
        context_required: false,
        minimum_confidence: 0.9,
        severity: Severity::High,
        max_matches: MatchLimit::First,
        description: "Quote and statement terminator followed by a SQL comment",
    },
    PatternDefinition {
        id: "time_based_attack",
        category: PatternCategory::SqlInjection,
        pattern: r"(?i)\bwaitfor\s+delay\b|\b(?:pg_)?sleep\(|\bbenchmark\(",
        context_required: false,
        minimum_confidence: 0.95,
        severity: Severity::Critical,
        max_matches: MatchLimit::All,
        description: "Time-based blind SQL injection",
    },
    PatternDefinition {
        id: "stacked_queries",
        category: PatternCategory::SqlInjection,
        pattern: r"(?i);\s*(?:drop|delete|insert|update|create|alter)\b",
        context_required: false,
        minimum_confidence: 0.9,
        severity: Severity::Critical,
        max_matches: MatchLimit::All,
        description: "Stacked query executing a data-modifying statement",
    },
    PatternDefinition {
        id: "classic_injection",
        category: PatternCategory::SqlInjection,
        pattern: r#"(?i)['"]\s*\)?\s*(?:or|and)\s+['"]?\w+['"]?\s*=\s*['"]?\w+"#,
        context_required: true,
        minimum_confidence: 0.85,
        severity: Severity::High,
        max_matches: MatchLimit::All,
        description: "Quote break-out followed by a boolean comparison",
    },
    PatternDefinition {
        id: "boolean_tautology",
        category: PatternCategory::SqlInjection,
        pattern: r"(?i)\b(?:or|and)\s+\d+\s*=\s*\d+\b",
        context_required: true,
        minimum_confidence: 0.8,
        severity: Severity::High,
        max_matches: MatchLimit::All,
        description: "Boolean tautology such as OR 1=1",
    },
    PatternDefinition {
        id: "quote_manipulation",
        category: PatternCategory::SqlInjection,
        pattern: r#"\\['"]|'{2,}|['"]\s*\+\s*['"]|['"]\s*\|\|\s*['"]"#,
        context_required: true,
        minimum_confidence: 0.7,
        severity: Severity::Medium,
        max_matches: MatchLimit::All,
        description: "Escaped, doubled or concatenated quotes",
    },
    PatternDefinition {
        id: "sql_keywords",
        category: PatternCategory::SqlInjection,
        pattern: r"(?i)\b(?:select|insert|update|delete|drop|create|alter)\b.*?\b(?:from|into|table|where)\b",
        context_required: true,
        minimum_confidence: 0.6,
        severity: Severity::Medium,
        max_matches: MatchLimit::First,
        description: "SQL verb together with a SQL clause keyword",
    },
];

/// Cross-site scripting rules.
///
/// Markup-shaped payloads are signatures; a bare `javascript:` inside
/// text only counts as evidence.
pub static XSS_PATTERNS: &[PatternDefinition] = &[
    PatternDefinition {
        id: "script_tag",
        category: PatternCategory::Xss,
        pattern: r"(?i)<\s*script\b",
        context_required: false,
        minimum_confidence: 0.95,
        severity: Severity::Critical,
        max_matches: MatchLimit::All,
        description: "Inline <script> element",
    },
    PatternDefinition {
        id: "event_handler",
        category: PatternCategory::Xss,
        pattern: r"(?i)<[a-z][a-z0-9]*\b[^<>]*?\son[a-z]+\s*=",
        context_required: false,
        minimum_confidence: 0.9,
        severity: Severity::High,
        max_matches: MatchLimit::All,
        description: "Inline DOM event handler attribute on a tag",
    },
    PatternDefinition {
        id: "javascript_uri",
        category: PatternCategory::Xss,
        pattern: r#"(?i)^\s*javascript\s*:|\b(?:href|src|action|formaction)\s*=\s*['"]?\s*javascript\s*:"#,
        context_required: false,
        minimum_confidence: 0.9,
        severity: Severity::High,
        max_matches: MatchLimit::All,
        description: "javascript: URI as a link or attribute value",
    },
    PatternDefinition {
        id: "javascript_scheme",
        category: PatternCategory::Xss,
        pattern: r"(?i)\bjavascript\s*:",
        context_required: true,
        minimum_confidence: 0.85,
        severity: Severity::Medium,
        max_matches: MatchLimit::First,
        description: "javascript: scheme inside text",
    },
];

/// Shell command injection rules
pub static COMMAND_INJECTION_PATTERNS: &[PatternDefinition] = &[
    PatternDefinition {
        id: "shell_payload",
        category: PatternCategory::CommandInjection,
        pattern: r"(?:;|&&|\|\|?)\s*(?:rm\s+-[a-zA-Z]*[rRf]|(?:wget|curl)\s+(?:-\S+\s+)*https?://|nc\s+(?:-\S+\s+)*-[a-z]*e\b|(?:ba)?sh\s+-c\b|chmod\s+(?:\+x|[0-7]{3,4})\b)",
        context_required: false,
        minimum_confidence: 0.9,
        severity: Severity::Critical,
        max_matches: MatchLimit::All,
        description: "Chained destructive or download-and-run shell command",
    },
    PatternDefinition {
        id: "shell_chain",
        category: PatternCategory::CommandInjection,
        pattern: r"(?:;|&&|\|\|?)\s*(?:rm|wget|curl|nc|bash|sh|chmod|cat)\s",
        context_required: true,
        minimum_confidence: 0.85,
        severity: Severity::Critical,
        max_matches: MatchLimit::All,
        description: "Shell command chained after a separator",
    },
    PatternDefinition {
        id: "command_substitution",
        category: PatternCategory::CommandInjection,
        pattern: r"\$\([^)]*\)|`[^`]*`",
        context_required: true,
        minimum_confidence: 0.85,
        severity: Severity::High,
        max_matches: MatchLimit::All,
        description: "Shell command substitution",
    },
];

/// One occurrence of a rule in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'t> {
    /// Byte offset of the match start
    pub offset: usize,
    /// Matched text
    pub text: &'t str,
}

impl PatternMatch<'_> {
    /// Length of the match in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True for zero-width matches
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A compiled matcher with a fixed match limit.
///
/// Holds no iteration state, so one matcher is safely shared across threads.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    limit: MatchLimit,
}

impl Matcher {
    /// Compile a matcher
    pub fn new(pattern: &str, limit: MatchLimit) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            limit,
        })
    }

    /// All reported occurrences in `text`, left to right
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<PatternMatch<'t>> {
        let found = self.regex.find_iter(text).map(|m| PatternMatch {
            offset: m.start(),
            text: m.as_str(),
        });

        match self.limit {
            MatchLimit::First => found.take(1).collect(),
            MatchLimit::All => found.collect(),
        }
    }

    /// Match limit
    pub fn limit(&self) -> MatchLimit {
        self.limit
    }

    /// Regex source
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// A compiled detection rule
#[derive(Debug, Clone)]
pub struct SecurityPattern {
    /// Unique identifier
    pub id: &'static str,
    /// Attack family
    pub category: PatternCategory,
    /// Compiled matcher
    pub matcher: Matcher,
    /// Needs context attenuation
    pub context_required: bool,
    /// Baseline confidence
    pub minimum_confidence: f64,
    /// Severity
    pub severity: Severity,
    /// Human-readable explanation
    pub description: &'static str,
}

impl SecurityPattern {
    /// Compile and validate a definition
    pub fn compile(def: &PatternDefinition) -> Result<Self> {
        if !(0.0..=1.0).contains(&def.minimum_confidence) {
            return Err(GuardError::InvalidPattern {
                id: def.id.to_string(),
                reason: format!(
                    "minimum confidence {} outside [0, 1]",
                    def.minimum_confidence
                ),
            });
        }

        let matcher =
            Matcher::new(def.pattern, def.max_matches).map_err(|e| GuardError::InvalidPattern {
                id: def.id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            id: def.id,
            category: def.category,
            matcher,
            context_required: def.context_required,
            minimum_confidence: def.minimum_confidence,
            severity: def.severity,
            description: def.description,
        })
    }

    /// Occurrences of this rule in `text`
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<PatternMatch<'t>> {
        self.matcher.find_all(text)
    }
}

/// Ordered, immutable rule catalog
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<SecurityPattern>,
}

lazy_static! {
    /// Process-wide built-in registry
    static ref BUILTIN_REGISTRY: Arc<PatternRegistry> = Arc::new(
        PatternRegistry::builtin().expect("built-in pattern tables failed to compile")
    );
}

impl PatternRegistry {
    /// Build a registry from definitions, in the given order.
    ///
    /// Fails on duplicate ids, confidences outside [0, 1] or regexes
    /// that do not compile.
    pub fn new<'a, I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a PatternDefinition>,
    {
        let mut seen = HashSet::new();
        let mut patterns = Vec::new();

        for def in definitions {
            if !seen.insert(def.id) {
                return Err(GuardError::InvalidPattern {
                    id: def.id.to_string(),
                    reason: "duplicate pattern id".to_string(),
                });
            }
            patterns.push(SecurityPattern::compile(def)?);
        }

        tracing::info!(count = patterns.len(), "Compiled pattern registry");
        Ok(Self { patterns })
    }

    /// The built-in catalog: SQL injection, then XSS, then command injection
    pub fn builtin() -> Result<Self> {
        Self::new(
            SQL_INJECTION_PATTERNS
                .iter()
                .chain(XSS_PATTERNS)
                .chain(COMMAND_INJECTION_PATTERNS),
        )
    }

    /// Shared built-in registry, compiled on first use
    pub fn global() -> &'static Self {
        &**BUILTIN_REGISTRY
    }

    /// Handle to the shared built-in registry
    pub fn shared() -> Arc<Self> {
        Arc::clone(&*BUILTIN_REGISTRY)
    }

    /// Rules in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &SecurityPattern> {
        self.patterns.iter()
    }

    /// Look up a rule by id
    pub fn get(&self, id: &str) -> Option<&SecurityPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// Rules of one category, in evaluation order
    pub fn by_category(&self, category: PatternCategory) -> impl Iterator<Item = &SecurityPattern> {
        self.patterns.iter().filter(move |p| p.category == category)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if the registry holds no rules
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
