//! Context analysis for match attenuation.
//!
//! Estimates whether a matched span sits in ordinary prose rather than in
//! executable syntax, and scores how lenient a whole content item should
//! be treated based on its declared type and lexical statistics.
//!
//! All functions are pure and deterministic.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::scoring::ScoringPolicy;

/// Words whose density marks text as prose
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

lazy_static! {
    static ref LEADING_CUE: Regex =
        Regex::new(r"(?i)\b(?:the|a|an|this|my|our|and|or|but|so|because)\s+$").expect("static regex");
    static ref TRAILING_CONJUNCTION: Regex =
        Regex::new(r"(?i)^\s+(?:and|or|but|so|because)\b").expect("static regex");
    static ref TRAILING_SUFFIX: Regex = Regex::new(r"(?i)^(?:ing|ed|er|est|ly)\b").expect("static regex");
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]\s+[A-Z]").expect("static regex");
    static ref TRAILING_TERMINATOR: Regex = Regex::new(r"[.!?]\s").expect("static regex");
    static ref SENTENCE_SPLIT: Regex = Regex::new(r"[.!?]+").expect("static regex");
    static ref JSON_LIKE: Regex = Regex::new(r"(?s)^\s*(?:\{.*\}|\[.*\])\s*$").expect("static regex");
    static ref FORM_ENCODED: Regex =
        Regex::new(r"^[\w.\-\[\]]+=[^&\s]*(?:&[\w.\-\[\]]+=[^&\s]*)*$").expect("static regex");
    static ref QUERY_STRING: Regex =
        Regex::new(r"^\?[\w.\-\[\]]+=[^&\s]*(?:&[\w.\-\[\]]+=[^&\s]*)*$").expect("static regex");
}

/// Declared semantic role of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    /// Machine-oriented values (search queries, ids, filters)
    Structured,
    /// Short human text (titles, reviews, descriptions)
    FreeText,
    /// A URL
    Url,
    /// A filesystem path
    FilePath,
    /// Long human text (announcements, messages)
    LongFormMessage,
}

impl ContentType {
    /// Classify content with no declared type.
    ///
    /// Anything that looks like JSON or form/query encoding is treated as
    /// structured, everything else as free text.
    pub fn infer(text: &str) -> Self {
        if is_structured_data(text) {
            ContentType::Structured
        } else {
            ContentType::FreeText
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Structured => write!(f, "STRUCTURED"),
            ContentType::FreeText => write!(f, "FREE_TEXT"),
            ContentType::Url => write!(f, "URL"),
            ContentType::FilePath => write!(f, "FILE_PATH"),
            ContentType::LongFormMessage => write!(f, "LONG_FORM_MESSAGE"),
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "structured" => Ok(ContentType::Structured),
            "free_text" | "text" => Ok(ContentType::FreeText),
            "url" => Ok(ContentType::Url),
            "file_path" | "path" => Ok(ContentType::FilePath),
            "long_form_message" | "long_form" | "message" => Ok(ContentType::LongFormMessage),
            _ => Err(format!(
                "unknown content type '{s}' (expected structured, free_text, url, file_path, long_form_message)"
            )),
        }
    }
}

/// Per-call description of where content came from.
///
/// Only `content_type` influences scoring; the other fields are carried
/// through for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    /// Declared content type
    pub content_type: ContentType,
    /// Role of the submitting user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    /// Endpoint the content was submitted to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Field the content was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

impl ValidationContext {
    /// Context with only a content type
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            user_role: None,
            endpoint: None,
            field_name: None,
        }
    }

    /// Context with an inferred content type
    pub fn inferred(text: &str) -> Self {
        Self::new(ContentType::infer(text))
    }

    /// Set user role
    pub fn with_user_role(mut self, role: impl Into<String>) -> Self {
        self.user_role = Some(role.into());
        self
    }

    /// Set endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set field name
    pub fn with_field_name(mut self, field: impl Into<String>) -> Self {
        self.field_name = Some(field.into());
        self
    }
}

/// Context heuristics bound to a scoring policy
#[derive(Debug, Clone, Default)]
pub struct ContextAnalyzer {
    policy: ScoringPolicy,
}

impl ContextAnalyzer {
    /// Create analyzer with the given policy
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Policy in use
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// True if the text around a match reads like prose.
    ///
    /// Looks at up to `context_window` characters on each side of the
    /// byte range `offset..offset + len`. Out-of-range or mid-character
    /// offsets are clamped to the nearest preceding char boundary.
    pub fn is_natural_language_context(&self, text: &str, offset: usize, len: usize) -> bool {
        let start = floor_char_boundary(text, offset);
        let end = floor_char_boundary(text, offset.saturating_add(len)).max(start);

        let before = window_before(text, start, self.policy.context_window);
        let after = window_after(text, end, self.policy.context_window);
        // The window may stop short of the text, so `$` alone is not the end.
        let ends_text = end + after.len() == text.len();

        LEADING_CUE.is_match(before)
            || TRAILING_CONJUNCTION.is_match(after)
            || TRAILING_SUFFIX.is_match(after)
            || SENTENCE_BREAK.is_match(before)
            || SENTENCE_BREAK.is_match(after)
            || TRAILING_TERMINATOR.is_match(after)
            || (ends_text && after.ends_with(|c: char| matches!(c, '.' | '!' | '?')))
    }

    /// Content-level leniency score in [0, 1].
    ///
    /// Higher means more prose-like and more lenient.
    pub fn analyze_content_context(&self, text: &str, context: &ValidationContext) -> f64 {
        let policy = &self.policy;
        let mut score = 0.0;

        score += match context.content_type {
            ContentType::FreeText | ContentType::LongFormMessage => policy.lenient_content_weight,
            ContentType::Structured => policy.strict_content_weight,
            ContentType::Url | ContentType::FilePath => policy.locator_content_weight,
        };

        let chars = text.chars().count();
        if chars > policy.long_text_chars {
            score += policy.long_text_weight;
        }
        if chars > policy.very_long_text_chars {
            score += policy.very_long_text_weight;
        }

        if sentence_groups(text) > policy.min_sentence_groups {
            score += policy.sentence_weight;
        }

        if stop_word_ratio(text) > policy.stop_word_ratio {
            score += policy.stop_word_weight;
        }

        score.clamp(0.0, 1.0)
    }
}

/// True if the whole text looks like JSON, form encoding or a query string
pub fn is_structured_data(text: &str) -> bool {
    let trimmed = text.trim();
    JSON_LIKE.is_match(trimmed) || FORM_ENCODED.is_match(trimmed) || QUERY_STRING.is_match(trimmed)
}

/// [`ContextAnalyzer::is_natural_language_context`] under the default policy
pub fn is_natural_language_context(text: &str, offset: usize, len: usize) -> bool {
    ContextAnalyzer::default().is_natural_language_context(text, offset, len)
}

/// [`ContextAnalyzer::analyze_content_context`] under the default policy
pub fn analyze_content_context(text: &str, context: &ValidationContext) -> f64 {
    ContextAnalyzer::default().analyze_content_context(text, context)
}

/// Number of pieces left after splitting on runs of `.`, `!` and `?`.
///
/// Trailing empty pieces count, so `"One. Two."` has three groups.
fn sentence_groups(text: &str) -> usize {
    SENTENCE_SPLIT.split(text).count()
}

/// Share of whitespace-separated tokens that are stop words
fn stop_word_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut stops = 0usize;
    for token in text.split_whitespace() {
        total += 1;
        if STOP_WORDS.contains(&token.to_lowercase().as_str()) {
            stops += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        stops as f64 / total as f64
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Up to `chars` characters ending at byte `end`
fn window_before(text: &str, end: usize, chars: usize) -> &str {
    let head = &text[..end];
    let start = match chars.checked_sub(1) {
        Some(n) => head.char_indices().rev().nth(n).map_or(0, |(i, _)| i),
        None => end,
    };
    &head[start..]
}

/// Up to `chars` characters starting at byte `start`
fn window_after(text: &str, start: usize, chars: usize) -> &str {
    let tail = &text[start..];
    let stop = tail.char_indices().nth(chars).map_or(tail.len(), |(i, _)| i);
    &tail[..stop]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn natural(text: &str, needle: &str) -> bool {
        let offset = text.find(needle).unwrap();
        is_natural_language_context(text, offset, needle.len())
    }

    #[test]
    fn test_natural_language_cues() {
        assert!(natural("we offer the select range of teas", "select"));
        assert!(natural("fresh bread and drop scones daily", "drop"));
        assert!(natural("prices were selected daily", "select"));
        assert!(natural("Thanks. We create fresh tables", "create"));
        assert!(natural("I said OR 1=1 is funny. Right", "OR 1=1"));
    }

    #[test]
    fn test_structured_context_is_not_natural() {
        assert!(!natural("1 AND 1=1", "AND 1=1"));
        assert!(!natural("id=5 OR 2=2", "OR 2=2"));
        assert!(!natural("", ""));
    }

    #[test]
    fn test_window_limits() {
        let text = format!("the {}x OR 1=1", "z".repeat(60));
        // "the" sits beyond the 50-character window
        assert!(!natural(&text, "OR 1=1"));
    }

    #[test]
    fn test_terminator_cut_by_window_is_not_sentence_end() {
        // The window ends on the decimal point of "1.5"
        let text = format!("select {}1.5 kg", "x".repeat(47));
        assert_eq!(window_after(&text, 6, 50).chars().last(), Some('.'));
        assert!(!natural(&text, "select"));

        assert!(natural("please drop it.", "drop"));
        assert!(natural("please drop it. ok", "drop"));
    }

    #[test]
    fn test_windows_respect_char_boundaries() {
        let text = "héllo wörld ünïcode";
        assert_eq!(window_before(text, text.len(), 3), "ode");
        assert_eq!(window_after(text, 0, 2), "hé");
        assert_eq!(window_after(text, text.len(), 5), "");
        // mid-character and out-of-range offsets are clamped, never panic
        let _ = is_natural_language_context(text, 2, 1);
        let _ = is_natural_language_context(text, 999, 10);
        let _ = is_natural_language_context(text, usize::MAX, usize::MAX);
    }

    #[test]
    fn test_structured_data_detection() {
        assert!(is_structured_data(r#"{"id": 1}"#));
        assert!(is_structured_data("[1, 2, 3]"));
        assert!(is_structured_data("name=bob&age=30"));
        assert!(is_structured_data("?q=apples&page=2"));
        assert!(!is_structured_data("Fresh organic vegetables"));
        assert!(!is_structured_data("x = 1 and more words"));
    }

    #[test]
    fn test_content_type_inference() {
        assert_eq!(ContentType::infer(r#"{"a":1}"#), ContentType::Structured);
        assert_eq!(ContentType::infer("hello there"), ContentType::FreeText);
        assert_eq!(
            ValidationContext::inferred("q=1").content_type,
            ContentType::Structured
        );
    }

    #[test]
    fn test_content_type_parse() {
        assert_eq!("free-text".parse::<ContentType>().unwrap(), ContentType::FreeText);
        assert_eq!(
            "LONG_FORM_MESSAGE".parse::<ContentType>().unwrap(),
            ContentType::LongFormMessage
        );
        assert!("blob".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_score_by_content_type() {
        let ctx = ValidationContext::new;
        assert_eq!(analyze_content_context("x", &ctx(ContentType::Structured)), 0.0);
        assert!((analyze_content_context("x", &ctx(ContentType::FreeText)) - 0.3).abs() < 1e-9);
        assert!((analyze_content_context("x", &ctx(ContentType::Url)) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_score_for_structured_tautology() {
        // STRUCTURED -0.2, "and" is one of three tokens +0.2
        let score = analyze_content_context("1 AND 1=1", &ValidationContext::new(ContentType::Structured));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_score_for_long_prose() {
        let text = "The market opens at dawn. Farmers bring produce from the valley. \
                    Buyers come early for the best picks! Is there parking? Yes, by the gate. "
            .repeat(6);
        let score =
            analyze_content_context(&text, &ValidationContext::new(ContentType::LongFormMessage));
        // 0.3 + 0.1 + 0.1 + 0.2 + 0.2
        assert!((score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_sentence_groups() {
        assert_eq!(sentence_groups(""), 1);
        assert_eq!(sentence_groups("Hello."), 2);
        assert_eq!(sentence_groups("One. Two... Three!"), 4);
    }

    #[test]
    fn test_stop_word_ratio() {
        assert_eq!(stop_word_ratio(""), 0.0);
        assert!((stop_word_ratio("the cat and the hat") - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_context_builders() {
        let ctx = ValidationContext::new(ContentType::FreeText)
            .with_user_role("vendor")
            .with_endpoint("/api/listings")
            .with_field_name("description");
        assert_eq!(ctx.user_role.as_deref(), Some("vendor"));
        assert_eq!(ctx.endpoint.as_deref(), Some("/api/listings"));
        assert_eq!(ctx.field_name.as_deref(), Some("description"));
    }
}
