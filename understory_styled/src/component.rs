// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component styles and the base style chain.

use alloc::string::String;
use alloc::sync::Arc;

use smallvec::SmallVec;
use understory_sheet::Tag;

use crate::context::ExecutionContext;
use crate::error::StyleError;
use crate::hash::ClassName;
use crate::identity::ComponentId;
use crate::interpolation::RuleSet;
use crate::registry::StyleRegistry;

#[derive(Debug)]
struct ComponentStyleInner {
    id: ComponentId,
    rules: RuleSet,
    base: Option<ComponentStyle>,
}

/// The rules of one component definition, plus the style it extends.
///
/// A component created from another styled component resolves the base
/// style first. Each level fingerprints under its own id, so the levels
/// never share cache entries.
///
/// ```rust
/// use understory_styled::{
///     ComponentStyle, ExecutionContext, IdentityAllocator, RuleSet, StyleRegistry,
/// };
///
/// let mut ids = IdentityAllocator::new();
/// let base = ComponentStyle::new(
///     ids.generate(Some("Base"), None),
///     RuleSet::new(["padding: 4px;".into()]),
///     None,
/// );
/// let child = ComponentStyle::new(
///     ids.generate(Some("Child"), None),
///     RuleSet::new(["color: red;".into()]),
///     Some(base),
/// );
///
/// let mut registry = StyleRegistry::new();
/// let names = child.generate(&mut registry, &ExecutionContext::default()).unwrap();
/// assert_eq!(names.split(' ').count(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct ComponentStyle {
    inner: Arc<ComponentStyleInner>,
}

impl ComponentStyle {
    /// Creates a component style.
    #[must_use]
    pub fn new(id: ComponentId, rules: RuleSet, base: Option<Self>) -> Self {
        Self {
            inner: Arc::new(ComponentStyleInner { id, rules, base }),
        }
    }

    /// Returns the component identity.
    #[must_use]
    pub fn id(&self) -> &ComponentId {
        &self.inner.id
    }

    /// Returns this level's rules.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.inner.rules
    }

    /// Returns the extended style, if any.
    #[must_use]
    pub fn base(&self) -> Option<&Self> {
        self.inner.base.as_ref()
    }

    /// Returns `true` if no level of the chain depends on the context.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inner.rules.is_static() && self.base().is_none_or(Self::is_static)
    }

    /// Resolves the chain, base first, and returns every generated name.
    ///
    /// Levels whose rules produce no CSS contribute no name.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error; levels resolved before it keep
    /// their injected CSS.
    pub fn generate_names<T: Tag>(
        &self,
        registry: &mut StyleRegistry<T>,
        cx: &ExecutionContext,
    ) -> Result<SmallVec<[ClassName; 2]>, StyleError> {
        let mut names = match self.base() {
            Some(base) => base.generate_names(registry, cx)?,
            None => SmallVec::new(),
        };
        if let Some(name) = registry.resolve(&self.inner.id, &self.inner.rules, cx)? {
            names.push(name);
        }
        Ok(names)
    }

    /// Like [`generate_names`](Self::generate_names), joined with spaces.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error.
    pub fn generate<T: Tag>(
        &self,
        registry: &mut StyleRegistry<T>,
        cx: &ExecutionContext,
    ) -> Result<String, StyleError> {
        let mut out = String::new();
        for name in self.generate_names(registry, cx)? {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&name);
        }
        Ok(out)
    }
}
