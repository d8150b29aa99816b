//! Benchmark for content validation.
//!
//! Typical form fields should validate well under a millisecond.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ctxguard::{ContentType, DetectionEngine, ValidationContext};

fn long_announcement() -> String {
    "The farmers market opens at dawn on Saturday and runs until noon. \
     Please bring your own bags, and remember that parking by the gate is limited! "
        .repeat(20)
}

fn bench_benign_free_text(c: &mut Criterion) {
    let engine = DetectionEngine::new();
    let context = ValidationContext::new(ContentType::FreeText);
    let text = "Fresh organic vegetables and 5 different varieties available daily";

    c.bench_function("validate_benign_free_text", |b| {
        b.iter(|| engine.validate_content(black_box(text), black_box(&context)));
    });
}

fn bench_long_form(c: &mut Criterion) {
    let engine = DetectionEngine::new();
    let context = ValidationContext::new(ContentType::LongFormMessage);
    let text = long_announcement();

    c.bench_function("validate_long_form_3kb", |b| {
        b.iter(|| engine.validate_content(black_box(&text), black_box(&context)));
    });
}

fn bench_attack_payload(c: &mut Criterion) {
    let engine = DetectionEngine::new();
    let context = ValidationContext::new(ContentType::Structured);
    let payload = "'; DROP TABLE users; -- ' OR 1=1 UNION SELECT password FROM admins";

    c.bench_function("validate_attack_payload", |b| {
        b.iter(|| engine.validate_content(black_box(payload), black_box(&context)));
    });
}

fn bench_pathological(c: &mut Criterion) {
    let engine = DetectionEngine::new();
    let context = ValidationContext::new(ContentType::Structured);
    let payload = format!("'{}", " ;".repeat(10_000));

    c.bench_function("validate_pathological_20kb", |b| {
        b.iter(|| engine.validate_content(black_box(&payload), black_box(&context)));
    });
}

criterion_group!(
    benches,
    bench_benign_free_text,
    bench_long_form,
    bench_attack_payload,
    bench_pathological
);
criterion_main!(benches);
