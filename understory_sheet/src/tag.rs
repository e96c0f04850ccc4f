// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat rule targets.
//!
//! A [`Tag`] is the physical, index-addressed list of CSS rules that a
//! [`GroupedBuffer`](crate::GroupedBuffer) writes through to. The grouped
//! view computes absolute rule indices from per-group sizes, so a host can
//! implement [`Tag`] over a live stylesheet surface and have it stay in sync
//! with the buffer without ever re-rendering the whole text.

use alloc::string::String;
use alloc::vec::Vec;

/// An index-addressed list of CSS rules.
pub trait Tag {
    /// Inserts `rule` at `index`.
    ///
    /// Returns `false` if the target rejected the rule; the buffer then does
    /// not count it towards the group.
    fn insert_rule(&mut self, index: usize, rule: &str) -> bool;

    /// Deletes the rule at `index`. Out-of-range indices are ignored.
    fn delete_rule(&mut self, index: usize);

    /// Returns the rule at `index`.
    fn get_rule(&self, index: usize) -> Option<&str>;

    /// Returns the number of rules.
    fn len(&self) -> usize;

    /// Returns `true` if there are no rules.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An in-memory [`Tag`] used for server rendering and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VirtualTag {
    rules: Vec<String>,
}

impl VirtualTag {
    /// Creates an empty tag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all rules in order.
    #[must_use]
    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}

impl Tag for VirtualTag {
    fn insert_rule(&mut self, index: usize, rule: &str) -> bool {
        if index > self.rules.len() {
            return false;
        }
        self.rules.insert(index, String::from(rule));
        true
    }

    fn delete_rule(&mut self, index: usize) {
        if index < self.rules.len() {
            self.rules.remove(index);
        }
    }

    fn get_rule(&self, index: usize) -> Option<&str> {
        self.rules.get(index).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.rules.len()
    }
}
