// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_styled` resolution.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use understory_styled::{
    ExecutionContext, IdentityAllocator, Interpolation, RuleSet, StyleObject, StyleRegistry,
    Stringifier, flatten, rule_set, styled,
};

fn themed_rules() -> RuleSet {
    rule_set![
        "display: flex; padding: 4px 8px; color: ",
        Interpolation::function(|cx: &ExecutionContext| cx.theme()["primary"].clone()),
        "; &:hover { color: ",
        Interpolation::function(|cx: &ExecutionContext| cx.theme()["accent"].clone()),
        "; } @media (min-width: 600px) { padding: 8px 16px; }",
    ]
}

fn theme(primary: &str) -> ExecutionContext {
    ExecutionContext::new(json!({ "primary": primary, "accent": "gold" }))
}

fn bench_resolve(c: &mut Criterion) {
    let mut ids = IdentityAllocator::new();
    let id = ids.generate(Some("Bench"), None);
    let rules = themed_rules();
    let red = theme("red");

    let mut group = c.benchmark_group("styled/resolve");

    group.bench_function("hit", |b| {
        let mut registry = StyleRegistry::new();
        registry.resolve(&id, &rules, &red).unwrap();
        b.iter(|| black_box(registry.resolve(&id, &rules, &red).unwrap()));
    });

    group.bench_function("static_hit", |b| {
        let rules = rule_set!["display: block; margin: 0 auto;"];
        let mut registry = StyleRegistry::new();
        let cx = ExecutionContext::default();
        registry.resolve(&id, &rules, &cx).unwrap();
        b.iter(|| black_box(registry.resolve(&id, &rules, &cx).unwrap()));
    });

    group.bench_function("miss", |b| {
        b.iter_batched(
            StyleRegistry::new,
            |mut registry| {
                black_box(registry.resolve(&id, &rules, &red).unwrap());
                registry
            },
            BatchSize::SmallInput,
        );
    });

    for variants in [10_usize, 100] {
        let contexts: Vec<_> = (0..variants).map(|n| theme(&format!("#{n:06x}"))).collect();
        group.bench_function(BenchmarkId::new("variants", variants), |b| {
            b.iter_batched(
                StyleRegistry::new,
                |mut registry| {
                    for cx in &contexts {
                        black_box(registry.resolve(&id, &rules, cx).unwrap());
                    }
                    registry
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();

    let mut group = c.benchmark_group("styled/pipeline");

    group.bench_function("flatten", |b| {
        b.iter(|| black_box(flatten(&rules, &red).unwrap()));
    });

    let object = StyleObject::new()
        .set("fontSize", 14.0)
        .set("lineHeight", 1.5)
        .set("&:hover", StyleObject::new().set("backgroundColor", "papayawhip"));
    let object_rules = rule_set![object];
    group.bench_function("flatten_object", |b| {
        b.iter(|| black_box(flatten(&object_rules, &red).unwrap()));
    });

    let css = flatten(&rules, &red).unwrap().css();
    let stringifier = Stringifier::default();
    group.bench_function("stringify", |b| {
        b.iter(|| black_box(stringifier.stringify(&css, ".abc", None, "Bench-x")));
    });

    let button = styled("button").unwrap().build(&mut ids, themed_rules()).unwrap();
    group.bench_function("render", |b| {
        let mut registry = StyleRegistry::new();
        b.iter(|| black_box(button.class_name(&mut registry, &red).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
