// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests of `StyleRegistry::resolve`.
//!
//! These cover caching, distinctness between components, buffer ordering and
//! reset isolation, using a themed color rule as the running example.

use serde_json::json;
use understory_styled::{
    Advisory, Browsers, ClassName, ComponentId, ExecutionContext, IdentityAllocator,
    Interpolation, LightningTransformerBuilder, RegistryOptionsBuilder, RuleSet, StyleRegistry,
    Stringifier, flatten, rule_set,
};

fn primary_color() -> RuleSet {
    rule_set![
        "color: ",
        Interpolation::function(|cx: &ExecutionContext| cx.theme()["primary"].clone()),
        ";",
    ]
}

fn theme(primary: &str) -> ExecutionContext {
    ExecutionContext::from_value(json!({ "theme": { "primary": primary } }))
}

fn resolve(registry: &mut StyleRegistry, id: &ComponentId, cx: &ExecutionContext) -> ClassName {
    registry
        .resolve(id, &primary_color(), cx)
        .expect("rules are well formed")
        .expect("rules produce css")
}

fn fragments(registry: &StyleRegistry) -> usize {
    registry.sheet().buffer().tag().rules().len()
}

/// The rule the registry's stringifier produces for `name` in `primary`.
fn rule(registry: &StyleRegistry, id: &ComponentId, name: &ClassName, primary: &str) -> String {
    registry.stringifier().stringify(
        &format!("color: {primary};"),
        &format!(".{name}"),
        None,
        id.as_str(),
    )
}

#[test]
fn repeated_resolves_inject_once() {
    let mut ids = IdentityAllocator::new();
    let button = ids.generate(Some("Button"), None);
    let mut registry = StyleRegistry::new();
    let red = theme("red");

    assert_eq!(
        flatten(&primary_color(), &red).unwrap().css(),
        "color: red;"
    );

    let first = resolve(&mut registry, &button, &red);
    assert_eq!(fragments(&registry), 1);
    let second = resolve(&mut registry, &button, &red);
    assert_eq!(first, second);
    assert_eq!(fragments(&registry), 1);

    let blue = resolve(&mut registry, &button, &theme("blue"));
    assert_ne!(first, blue);
    assert_eq!(fragments(&registry), 2);
    assert_eq!(
        registry.materialize(),
        rule(&registry, &button, &first, "red") + &rule(&registry, &button, &blue, "blue")
    );
}

#[test]
fn identical_rules_on_different_components_stay_distinct() {
    let mut ids = IdentityAllocator::new();
    let a = ids.generate(Some("Same"), None);
    let b = ids.generate(Some("Same"), None);
    let mut registry = StyleRegistry::new();
    let red = theme("red");

    let name_a = resolve(&mut registry, &a, &red);
    let name_b = resolve(&mut registry, &b, &red);
    assert_ne!(name_a, name_b);
    assert_eq!(fragments(&registry), 2);
}

#[test]
fn groups_follow_first_use_and_fragments_follow_call_order() {
    let mut ids = IdentityAllocator::new();
    let a = ids.generate(Some("A"), None);
    let b = ids.generate(Some("B"), None);
    let mut registry = StyleRegistry::new();

    // T1..T5, interleaved across two components.
    let colors = ["#111111", "#222222", "#333333", "#444444", "#555555"];
    let t1 = resolve(&mut registry, &b, &theme(colors[0]));
    let t2 = resolve(&mut registry, &a, &theme(colors[1]));
    let t3 = resolve(&mut registry, &b, &theme(colors[2]));
    let t4 = resolve(&mut registry, &a, &theme(colors[3]));
    let t5 = resolve(&mut registry, &b, &theme(colors[4]));

    // `b` was allocated first, so its group comes first.
    let expected = [
        (&b, &t1, colors[0]),
        (&b, &t3, colors[2]),
        (&b, &t5, colors[4]),
        (&a, &t2, colors[1]),
        (&a, &t4, colors[3]),
    ]
    .map(|(id, name, primary)| rule(&registry, id, name, primary))
    .concat();
    assert_eq!(registry.materialize(), expected);
    assert_eq!(
        registry.sheet().touched_ids().collect::<Vec<_>>(),
        [b.as_str(), a.as_str()]
    );
}

#[test]
fn stringifying_twice_is_byte_identical() {
    let stringifier = Stringifier::default();
    let css = flatten(&primary_color(), &theme("red")).unwrap().css();
    assert_eq!(
        stringifier.stringify(&css, ".x", None, "C-1"),
        stringifier.stringify(&css, ".x", None, "C-1")
    );
}

#[test]
fn reset_starts_a_clean_scope() {
    let mut ids = IdentityAllocator::new();
    let a = ids.generate(Some("A"), None);
    let b = ids.generate(Some("B"), None);
    let mut registry = StyleRegistry::new();

    let before = resolve(&mut registry, &a, &theme("red"));
    let css_before = registry.materialize();

    registry.reset();
    assert!(registry.is_empty());
    assert_eq!(registry.materialize(), "");

    let blue = resolve(&mut registry, &b, &theme("blue"));
    let after = resolve(&mut registry, &a, &theme("red"));
    let css_after = registry.materialize();

    // Fresh injection, same deterministic name, no leftover fragments.
    assert_eq!(before, after);
    assert_eq!(fragments(&registry), 2);
    assert_eq!(css_after, rule(&registry, &b, &blue, "blue") + &css_before);
    assert_eq!(
        registry.sheet().touched_ids().collect::<Vec<_>>(),
        [b.as_str(), a.as_str()]
    );
}

#[test]
fn threshold_advisory_fires_exactly_once_at_201_variants() {
    let mut ids = IdentityAllocator::new();
    let id = ids.generate(Some("Varying"), None);
    let mut registry = StyleRegistry::with_options(
        RegistryOptionsBuilder::new().warn_threshold(Some(200)).build(),
    );

    let mut names = Vec::new();
    for n in 0..201 {
        names.push(resolve(&mut registry, &id, &theme(&format!("#{n:06x}"))));
    }

    let advisories = registry.take_advisories();
    assert_eq!(advisories.len(), 1);
    assert!(matches!(
        &advisories[0],
        Advisory::TooManyClasses { component_id, threshold: 200 } if **component_id == *id.as_str()
    ));

    names.sort();
    names.dedup();
    assert_eq!(names.len(), 201);
    assert_eq!(fragments(&registry), 201);
    assert_eq!(registry.variant_count(&id), 201);
}

#[test]
fn errors_leave_the_buffer_untouched() {
    let mut ids = IdentityAllocator::new();
    let id = ids.generate(None, None);
    let mut registry = StyleRegistry::new();
    let rules = rule_set![
        "display: block;",
        Interpolation::function(|cx: &ExecutionContext| cx.prop("flag").clone()),
    ];

    let flagged = ExecutionContext::from_value(json!({ "flag": true }));
    assert!(registry.resolve(&id, &rules, &flagged).is_err());
    assert_eq!(fragments(&registry), 0);
    assert!(registry.is_empty());

    let unflagged = ExecutionContext::from_value(json!({ "flag": false }));
    assert!(registry.resolve(&id, &rules, &unflagged).unwrap().is_some());
}

#[test]
fn removed_components_keep_their_slot() {
    let mut ids = IdentityAllocator::new();
    let a = ids.generate(Some("A"), None);
    let b = ids.generate(Some("B"), None);
    let mut registry = StyleRegistry::new();

    let red = resolve(&mut registry, &a, &theme("red"));
    let blue = resolve(&mut registry, &b, &theme("blue"));

    let blue_rule = rule(&registry, &b, &blue, "blue");
    assert!(registry.remove_component(&a));
    assert_eq!(registry.materialize(), blue_rule);

    // Resolving while removed records the name but keeps the css stashed.
    let green = resolve(&mut registry, &a, &theme("green"));
    assert_eq!(registry.materialize(), blue_rule);

    assert!(registry.reinsert_component(&a));
    assert_eq!(
        registry.materialize(),
        rule(&registry, &a, &red, "red") + &rule(&registry, &a, &green, "green") + &blue_rule
    );
}

#[test]
fn browser_targets_shape_the_injected_rules() {
    let mut ids = IdentityAllocator::new();
    let id = ids.generate(Some("Chip"), None);
    let rules = rule_set!["user-select: none; &:hover { ", primary_color(), " }"];
    let safari = Stringifier::new(
        LightningTransformerBuilder::new()
            .browsers(Browsers {
                safari: Some(13 << 16),
                ..Browsers::default()
            })
            .build(),
    );
    let mut registry =
        StyleRegistry::with_options(RegistryOptionsBuilder::new().stringifier(safari).build());

    let name = registry.resolve(&id, &rules, &theme("red")).unwrap().unwrap();
    let css = registry.materialize();
    assert!(css.contains("-webkit-user-select:none"), "{css}");
    assert!(css.contains(&format!(".{name}:hover{{color:red}}")), "{css}");

    // Without targets the same text gets a different name and no prefix.
    let mut plain = StyleRegistry::new();
    let plain_name = plain.resolve(&id, &rules, &theme("red")).unwrap().unwrap();
    assert_ne!(name, plain_name);
    assert!(!plain.materialize().contains("-webkit-"));
}
