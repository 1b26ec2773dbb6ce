//! Rule resolution benchmarks
//!
//! Decisions are made twice per request, so their cost is paid on every
//! request whether or not anything is logged.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::{Method, StatusCode};
use serde_json::json;
use trafficlog_core::Ruleset;

fn rules_with(extra_rules: usize) -> Ruleset {
    let mut tokens = vec![json!("headers"), json!({"post": "request_bodies"})];
    for i in 0..extra_rules {
        let code = 400 + (i % 100) as u16;
        tokens.push(json!({ (code.to_string()): {"get": "response_bodies"} }));
    }
    tokens.push(json!({"only": {"get": true, "post": true, "500...600": "all"}}));
    Ruleset::from_json(serde_json::Value::Array(tokens)).unwrap()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for size in [0usize, 10, 100] {
        let rules = rules_with(size);

        group.bench_with_input(BenchmarkId::new("request_phase", size), &rules, |b, rules| {
            b.iter(|| rules.resolve(black_box(&Method::POST), None))
        });

        group.bench_with_input(BenchmarkId::new("response_phase", size), &rules, |b, rules| {
            b.iter(|| rules.resolve(black_box(&Method::GET), Some(StatusCode::NOT_FOUND)))
        });
    }

    group.finish();
}

fn bench_config_resolution(c: &mut Criterion) {
    let source = r#"["headers", "get", "post", 404, "500...600",
        {"post": "request_bodies", "delete": false},
        {"only": {"put": "all", "get": true, "post": true}},
        {"get": {"200": ["response_bodies"], "301..302": false}}]"#;

    c.bench_function("config_resolution", |b| {
        b.iter(|| Ruleset::from_json_str(black_box(source)).unwrap())
    });
}

criterion_group!(benches, bench_resolve, bench_config_resolution);
criterion_main!(benches);
