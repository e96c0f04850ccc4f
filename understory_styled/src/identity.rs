// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component identities.
//!
//! A [`ComponentId`] is assigned once per component definition. Its string
//! form keys the component's injection group and feeds every fingerprint the
//! component produces, so two definitions never share cache entries.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::error::StyleError;
use crate::hash::{alphabetic_name, component_id_hash};

const DEFAULT_PREFIX: &str = "sc";

/// Replaces runs of selector-unsafe characters with `-` and trims dashes.
///
/// ```rust
/// use understory_styled::escape;
///
/// assert_eq!(escape("styled.div"), "styled-div");
/// assert_eq!(escape("Styled(Fancy Button)"), "Styled-Fancy-Button");
/// assert_eq!(escape("--"), "");
/// ```
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            if dash && !out.is_empty() {
                out.push('-');
            }
            dash = false;
            out.push(c);
        } else {
            dash = true;
        }
    }
    out
}

/// A component's identity: a monotonic index and a stable id string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ComponentId {
    index: u32,
    id: Arc<str>,
}

impl ComponentId {
    /// Returns the declaration index, unique within its allocator.
    #[must_use]
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the id string.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Returns the shared id string.
    #[must_use]
    pub fn shared(&self) -> &Arc<str> {
        &self.id
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({}, {:?})", self.index, &*self.id)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Assigns component identities in declaration order.
///
/// Generated ids look like `Button-hjKlm`: the escaped display prefix (or
/// `sc`) followed by a hash of the prefix and how many components have used
/// that prefix so far. The same declaration sequence always yields the same
/// ids.
///
/// ```rust
/// use understory_styled::IdentityAllocator;
///
/// let mut ids = IdentityAllocator::new();
/// let a = ids.generate(Some("Button"), None);
/// let b = ids.generate(Some("Button"), None);
/// assert!(a.as_str().starts_with("Button-"));
/// assert_ne!(a, b);
/// assert_eq!(b.index(), a.index() + 1);
///
/// let mut again = IdentityAllocator::new();
/// assert_eq!(again.generate(Some("Button"), None).as_str(), a.as_str());
/// ```
#[derive(Clone, Debug, Default)]
pub struct IdentityAllocator {
    next_index: u32,
    counters: HashMap<String, u32>,
}

impl IdentityAllocator {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many identities have been assigned.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.next_index
    }

    /// Returns `true` if no identity has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    fn next_index(&mut self) -> u32 {
        let index = self.next_index;
        self.next_index = index.checked_add(1).expect("component index overflow");
        index
    }

    /// Generates an identity from an optional display prefix.
    ///
    /// A `parent` id, when given, is prepended so that derived components
    /// stay attributable to the component they were derived from.
    pub fn generate(&mut self, display_prefix: Option<&str>, parent: Option<&str>) -> ComponentId {
        let name = display_prefix
            .map(escape)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        let counter = self.counters.entry(name.clone()).or_insert(0);
        *counter += 1;
        let suffix = alphabetic_name(u64::from(component_id_hash(&format!("{name}{counter}"))));
        let id = match parent {
            Some(parent) if !parent.is_empty() => format!("{parent}-{name}-{suffix}"),
            _ => format!("{name}-{suffix}"),
        };
        ComponentId {
            index: self.next_index(),
            id: id.into(),
        }
    }

    /// Adopts a caller-supplied id.
    ///
    /// With a display prefix the id becomes `{escaped prefix}-{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidTarget`] if `id` is empty.
    pub fn declare(&mut self, id: &str, display_prefix: Option<&str>) -> Result<ComponentId, StyleError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(StyleError::invalid_target(id, "component id is empty"));
        }
        let id = match display_prefix.map(escape).filter(|prefix| !prefix.is_empty()) {
            Some(prefix) => format!("{prefix}-{id}"),
            None => id.to_string(),
        };
        Ok(ComponentId {
            index: self.next_index(),
            id: id.into(),
        })
    }
}

/// The identities a component answers to: the ones it was folded from, then
/// its own.
///
/// Folding is display-only. Fingerprints always use the component's own id.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityChain {
    folded: SmallVec<[Arc<str>; 2]>,
    own: Arc<str>,
}

impl IdentityChain {
    /// A chain with no folded identities.
    #[must_use]
    pub fn root(own: &ComponentId) -> Self {
        Self {
            folded: SmallVec::new(),
            own: own.shared().clone(),
        }
    }

    /// Returns the component's own id.
    #[must_use]
    pub fn own(&self) -> &str {
        &self.own
    }

    /// Returns the folded ids, outermost ancestor first.
    pub fn folded(&self) -> impl Iterator<Item = &str> + '_ {
        self.folded.iter().map(|id| &**id)
    }

    /// Returns every id, ancestors first and the own id last.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.folded().chain(core::iter::once(&*self.own))
    }

    /// Returns a human-readable composite label, e.g. `Button-a > Primary-b`.
    #[must_use]
    pub fn display_label(&self) -> String {
        let mut label = String::new();
        for id in self.iter() {
            if !label.is_empty() {
                label.push_str(" > ");
            }
            label.push_str(id);
        }
        label
    }
}

impl fmt::Debug for IdentityChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Extends `parent`'s chain with `child`.
///
/// The result names `child` as its own identity and lists every identity of
/// `parent` before it.
#[must_use]
pub fn fold_identities(parent: &IdentityChain, child: &ComponentId) -> IdentityChain {
    let mut folded = parent.folded.clone();
    folded.push(parent.own.clone());
    IdentityChain {
        folded,
        own: child.shared().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn default_prefix_is_used_for_missing_or_unsafe_names() {
        let mut ids = IdentityAllocator::new();
        assert!(ids.generate(None, None).as_str().starts_with("sc-"));
        assert!(ids.generate(Some("!!"), None).as_str().starts_with("sc-"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn parent_ids_are_prepended() {
        let mut ids = IdentityAllocator::new();
        let parent = ids.generate(Some("Base"), None);
        let child = ids.generate(Some("Child"), Some(parent.as_str()));
        assert!(child.as_str().starts_with(&format!("{}-Child-", parent.as_str())));
    }

    #[test]
    fn declared_ids_take_an_escaped_prefix() {
        let mut ids = IdentityAllocator::new();
        let id = ids.declare("fixed", Some("styled.div")).unwrap();
        assert_eq!(id.as_str(), "styled-div-fixed");
        assert_eq!(ids.declare("fixed", None).unwrap().as_str(), "fixed");
        assert!(matches!(
            ids.declare("  ", None),
            Err(StyleError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn folding_is_display_only_and_ordered() {
        let mut ids = IdentityAllocator::new();
        let a = ids.generate(Some("A"), None);
        let b = ids.generate(Some("B"), None);
        let c = ids.generate(Some("C"), None);

        let chain = fold_identities(&fold_identities(&IdentityChain::root(&a), &b), &c);
        assert_eq!(chain.own(), c.as_str());
        assert_eq!(
            chain.iter().collect::<Vec<_>>(),
            [a.as_str(), b.as_str(), c.as_str()]
        );
        assert_eq!(
            chain.display_label(),
            format!("{a} > {b} > {c}")
        );
    }
}
