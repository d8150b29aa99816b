//! Property-based tests for the detection engine.
//!
//! Checks the invariants that must hold for any input: confidence ranges,
//! the validity rule, determinism, monotonicity under a more lenient
//! context and context invariance of signature rules.

use ctxguard::security::{
    adjust_confidence, analyze_content_context, Adjustment, PatternRegistry, ScoringPolicy,
};
use ctxguard::{validate_content, ContentType, DetectionEngine, ThreatLevel, ValidationContext};
use proptest::prelude::*;

fn content_type() -> impl Strategy<Value = ContentType> {
    prop_oneof![
        Just(ContentType::Structured),
        Just(ContentType::FreeText),
        Just(ContentType::Url),
        Just(ContentType::FilePath),
        Just(ContentType::LongFormMessage),
    ]
}

/// Text mixing attack fragments with prose so that rules actually fire
fn content() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("' OR 1=1".to_string()),
        Just("UNION SELECT".to_string()),
        Just("; DROP TABLE t".to_string()),
        Just("--".to_string()),
        Just("select name from users where".to_string()),
        Just("and 2=2".to_string()),
        Just("<script>".to_string()),
        Just("$(id)".to_string()),
        Just("the".to_string()),
        Just("Thank you. We".to_string()),
        "[a-zA-Z0-9 '\";=().!?<>-]{0,20}",
    ];
    prop::collection::vec(fragment, 0..8).prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn prop_confidence_ranges(text in content(), ct in content_type()) {
        let result = validate_content(&text, &ValidationContext::new(ct));
        prop_assert!((0.0..=1.0).contains(&result.confidence));
        for v in &result.violations {
            prop_assert!(v.confidence >= 0.5 && v.confidence <= 1.0);
        }
    }

    #[test]
    fn prop_validity_rule(text in content(), ct in content_type()) {
        let result = validate_content(&text, &ValidationContext::new(ct));
        let rejecting = result.violations.iter().any(|v| v.confidence >= 0.8);
        prop_assert_eq!(result.is_valid, !rejecting);
        if result.is_valid {
            prop_assert_eq!(result.threat_level, ThreatLevel::None);
        }
    }

    #[test]
    fn prop_max_confidence(text in content(), ct in content_type()) {
        let result = validate_content(&text, &ValidationContext::new(ct));
        let max = result.violations.iter().map(|v| v.confidence).fold(0.0, f64::max);
        prop_assert_eq!(result.confidence, max);
    }

    #[test]
    fn prop_deterministic(text in content(), ct in content_type()) {
        let context = ValidationContext::new(ct);
        prop_assert_eq!(validate_content(&text, &context), validate_content(&text, &context));
    }

    #[test]
    fn prop_arbitrary_input_never_panics(text in any::<String>(), ct in content_type()) {
        let result = validate_content(&text, &ValidationContext::new(ct));
        prop_assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn prop_score_in_unit_range(text in any::<String>(), ct in content_type()) {
        let score = analyze_content_context(&text, &ValidationContext::new(ct));
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn prop_leniency_never_raises_confidence(
        base in 0.0f64..=1.0,
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
        natural in any::<bool>(),
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let policy = ScoringPolicy::default();
        let adjust = |score| adjust_confidence(
            base,
            &[Adjustment::NaturalLanguage { natural }, Adjustment::ContextScore { score }],
            &policy,
        );
        prop_assert!(adjust(high) <= adjust(low));
        prop_assert!(adjust(low) <= base);
    }

    #[test]
    fn prop_structured_to_long_form_never_raises(text in content()) {
        let engine = DetectionEngine::new();
        let strict = ValidationContext::new(ContentType::Structured);
        let lenient = ValidationContext::new(ContentType::LongFormMessage);
        let strict_score = analyze_content_context(&text, &strict);
        let lenient_score = analyze_content_context(&text, &lenient);
        prop_assert!(lenient_score >= strict_score);

        for pattern in engine.registry().iter() {
            for found in pattern.find_all(&text) {
                let strict_conf =
                    engine.attenuate(pattern, &text, found.offset, found.len(), strict_score);
                let lenient_conf =
                    engine.attenuate(pattern, &text, found.offset, found.len(), lenient_score);
                prop_assert!(lenient_conf <= strict_conf);
            }
        }
    }

    #[test]
    fn prop_signatures_are_context_invariant(text in content(), ct in content_type()) {
        let result = validate_content(&text, &ValidationContext::new(ct));
        let registry = PatternRegistry::global();
        for v in &result.violations {
            let pattern = registry.get(&v.pattern_id).unwrap();
            if !pattern.context_required {
                prop_assert_eq!(v.confidence, pattern.minimum_confidence);
            }
        }
    }

    #[test]
    fn prop_threat_fold_is_monotone(confidences in prop::collection::vec(0.0f64..=1.0, 0..20)) {
        let policy = ScoringPolicy::default();
        let mut level = ThreatLevel::None;
        let mut seen_high = false;
        for c in confidences {
            let next = policy.fold_threat(level, c);
            prop_assert!(next >= level);
            seen_high |= c >= 0.9;
            if seen_high {
                prop_assert_eq!(next, ThreatLevel::High);
            }
            level = next;
        }
    }
}
