// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for name stability and escaping.

use proptest::prelude::*;
use serde_json::json;
use understory_styled::{
    ExecutionContext, IdentityAllocator, Interpolation, StyleRegistry, alphabetic_name, escape,
    rule_set,
};

proptest! {
    #[test]
    fn alphabetic_names_are_injective(a in any::<u64>(), b in any::<u64>()) {
        prop_assume!(a != b);
        prop_assert_ne!(alphabetic_name(a), alphabetic_name(b));
    }

    #[test]
    fn alphabetic_names_stay_in_class_alphabet(n in any::<u64>()) {
        let name = alphabetic_name(n);
        prop_assert!(!name.is_empty());
        prop_assert!(name.chars().all(|c| c.is_ascii_alphabetic() || c == '-'));
        prop_assert!(name.starts_with(|c: char| c.is_ascii_alphabetic()));
    }

    #[test]
    fn escaped_ids_are_class_safe(raw in ".{0,40}") {
        let escaped = escape(&raw);
        prop_assert!(escaped.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-'));
        prop_assert!(!escaped.starts_with('-') && !escaped.ends_with('-'));
    }

    #[test]
    fn equal_contexts_resolve_to_equal_names(values in prop::collection::vec(0_u16..16, 1..64)) {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(Some("Prop"), None);
        let rules = rule_set![
            "width: ",
            Interpolation::function(|cx: &ExecutionContext| cx.prop("w").clone()),
            "px;",
        ];
        let mut registry = StyleRegistry::new();

        let mut seen = std::collections::HashMap::new();
        for value in &values {
            let cx = ExecutionContext::from_value(json!({ "w": value }));
            let name = registry.resolve(&id, &rules, &cx).unwrap().unwrap();
            let previous = seen.entry(*value).or_insert_with(|| name.clone());
            prop_assert_eq!(&*previous, &name);
        }
        prop_assert_eq!(registry.len(), seen.len());
        prop_assert_eq!(registry.sheet().buffer().tag().rules().len(), seen.len());
    }
}
