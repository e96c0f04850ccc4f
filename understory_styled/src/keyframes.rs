// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation keyframes.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use understory_sheet::{StyleSheet, Tag};

use crate::context::ExecutionContext;
use crate::error::StyleError;
use crate::flatten::flatten;
use crate::hash::{ClassName, alphabetic_name, truncate_hash};
use crate::interpolation::RuleSet;
use crate::stringify::Stringifier;

struct KeyframesInner {
    id: Arc<str>,
    name: ClassName,
    body: String,
}

/// A named `@keyframes` rule.
///
/// The name is derived from the keyframes body, so equal bodies share one
/// name. Interpolating a `Keyframes` into a rule set yields its name, and
/// resolving that rule set injects the `@keyframes` rule into the keyframes'
/// own group once per registry.
///
/// ```rust
/// use understory_styled::{Keyframes, RuleSet};
///
/// let fade = Keyframes::new(RuleSet::new(["from { opacity: 0; } to { opacity: 1; }".into()]))
///     .unwrap();
/// assert_eq!(fade.id(), format!("sc-keyframes-{}", fade.name()));
/// ```
#[derive(Clone)]
pub struct Keyframes {
    inner: Arc<KeyframesInner>,
}

impl Keyframes {
    /// Creates keyframes from a rule set.
    ///
    /// The rules are flattened once, against an empty context.
    ///
    /// # Errors
    ///
    /// Returns the flattening error, if any.
    pub fn new(rules: RuleSet) -> Result<Self, StyleError> {
        let body = flatten(&rules, &ExecutionContext::default())?.css();
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"understory_styled::Keyframes/1");
        hasher.update(body.as_bytes());
        let name = ClassName::from(alphabetic_name(truncate_hash(&hasher.finalize())).as_str());
        Ok(Self {
            inner: Arc::new(KeyframesInner {
                id: format!("sc-keyframes-{name}").into(),
                name,
                body,
            }),
        })
    }

    /// Returns the animation name.
    #[must_use]
    pub fn name(&self) -> &ClassName {
        &self.inner.name
    }

    /// Returns the id of the group the rule is injected into.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Injects the `@keyframes` rule into `sheet` unless it is already there.
    ///
    /// Returns `true` if a rule was inserted.
    pub fn inject<T: Tag>(&self, sheet: &mut StyleSheet<T>, stringifier: &Stringifier) -> bool {
        let inner = &*self.inner;
        if sheet.has_name_for_id(&inner.id, &inner.name) {
            return false;
        }
        let css = stringifier.stringify(&inner.body, &inner.name, Some("@keyframes"), &inner.id);
        sheet.insert_rules(&inner.id, &inner.name, [css]) > 0
    }
}

impl PartialEq for Keyframes {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Keyframes {}

impl fmt::Debug for Keyframes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyframes")
            .field("name", &self.inner.name)
            .field("body", &self.inner.body)
            .finish_non_exhaustive()
    }
}
