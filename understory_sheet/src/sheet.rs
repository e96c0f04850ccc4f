// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component-id keyed stylesheet.
//!
//! [`StyleSheet`] binds component ids to groups of a [`GroupedBuffer`] and
//! remembers which class names were injected for each id, so callers can
//! ask "is `name` already present for `id`?" before rendering CSS.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashSet;
use tracing::debug;

use crate::buffer::{GroupState, GroupedBuffer};
use crate::group::{GroupAllocator, GroupId};
use crate::tag::{Tag, VirtualTag};

/// Names registered for one group, kept in registration order.
#[derive(Clone, Debug, Default)]
struct NameSet {
    order: Vec<Arc<str>>,
    members: HashSet<Arc<str>>,
}

impl NameSet {
    fn insert(&mut self, name: &str) -> bool {
        if self.members.contains(name) {
            return false;
        }
        let name: Arc<str> = Arc::from(name);
        self.order.push(name.clone());
        self.members.insert(name);
        true
    }

    fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

/// A stylesheet partitioned into one group per component id.
///
/// # Example
///
/// ```rust
/// use understory_sheet::StyleSheet;
///
/// let mut sheet = StyleSheet::new();
/// sheet.insert_rules("Button-a1", "xyz", [".xyz{color:red;}"]);
/// sheet.insert_rules("Link-b2", "abc", [".abc{color:blue;}"]);
///
/// assert!(sheet.has_name_for_id("Button-a1", "xyz"));
/// assert!(!sheet.has_name_for_id("Link-b2", "xyz"));
/// assert_eq!(sheet.materialize(), ".xyz{color:red;}.abc{color:blue;}");
/// ```
#[derive(Clone, Debug, Default)]
pub struct StyleSheet<T = VirtualTag> {
    groups: GroupAllocator,
    buffer: GroupedBuffer<T>,
    names: Vec<NameSet>,
}

impl StyleSheet<VirtualTag> {
    /// Creates an empty in-memory sheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Tag> StyleSheet<T> {
    /// Creates an empty sheet writing through to `tag`.
    #[must_use]
    pub fn with_tag(tag: T) -> Self {
        Self {
            groups: GroupAllocator::new(),
            buffer: GroupedBuffer::with_tag(tag),
            names: Vec::new(),
        }
    }

    /// Returns the underlying grouped buffer.
    #[must_use]
    pub fn buffer(&self) -> &GroupedBuffer<T> {
        &self.buffer
    }

    /// Returns the group allocator.
    #[must_use]
    pub fn groups(&self) -> &GroupAllocator {
        &self.groups
    }

    /// Allocates (or returns) the group for `id`.
    pub fn register_id(&mut self, id: &str) -> GroupId {
        if let Some(group) = self.groups.group_for_id(id) {
            return group;
        }
        let group = self.groups.allocate(id);
        self.buffer.allocate(group);
        debug!(component_id = id, %group, "allocated style group");
        group
    }

    /// Returns the group for `id`, if allocated.
    #[must_use]
    pub fn group_for_id(&self, id: &str) -> Option<GroupId> {
        self.groups.group_for_id(id)
    }

    /// Returns the state of the group for `id`.
    #[must_use]
    pub fn group_state(&self, id: &str) -> Option<GroupState> {
        self.groups
            .group_for_id(id)
            .and_then(|group| self.buffer.group_state(group))
    }

    /// Returns `true` if `name` was registered for `id`.
    #[must_use]
    pub fn has_name_for_id(&self, id: &str, name: &str) -> bool {
        self.groups
            .group_for_id(id)
            .and_then(|group| self.names.get(group.as_usize()))
            .is_some_and(|names| names.contains(name))
    }

    /// Returns the names registered for `id` in registration order.
    pub fn names_for_id(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.groups
            .group_for_id(id)
            .into_iter()
            .flat_map(|group| self.names_for_group(group))
    }

    /// Returns the names registered for `group` in registration order.
    pub fn names_for_group(&self, group: GroupId) -> impl Iterator<Item = &str> + '_ {
        self.names
            .get(group.as_usize())
            .into_iter()
            .flat_map(|names| names.order.iter().map(|name| &**name))
    }

    /// Registers `name` for `id` without inserting any CSS.
    ///
    /// Returns `false` if the name was already registered.
    pub fn register_name(&mut self, id: &str, name: &str) -> bool {
        let group = self.register_id(id);
        self.names_for_group_mut(group).insert(name)
    }

    /// Registers `name` for `id` and appends `rules` to its group.
    ///
    /// Returns the number of fragments that became live.
    pub fn insert_rules<I, S>(&mut self, id: &str, name: &str, rules: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let group = self.register_id(id);
        self.names_for_group_mut(group).insert(name);
        self.buffer.insert_rules(group, rules)
    }

    /// Appends `rules` to `group` without touching names.
    pub fn insert_rules_for_group<I, S>(&mut self, group: GroupId, rules: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.buffer.insert_rules(group, rules)
    }

    /// Forgets the names registered for `id`; its CSS stays.
    pub fn clear_names(&mut self, id: &str) {
        if let Some(group) = self.groups.group_for_id(id) {
            if let Some(names) = self.names.get_mut(group.as_usize()) {
                names.clear();
            }
        }
    }

    /// Drops the CSS and the names of `id`; its group slot stays.
    pub fn clear_rules(&mut self, id: &str) {
        if let Some(group) = self.groups.group_for_id(id) {
            self.buffer.clear_group(group);
        }
        self.clear_names(id);
    }

    /// Detaches the group of `id` without disturbing any other group.
    pub fn remove_group(&mut self, id: &str) -> bool {
        self.groups
            .group_for_id(id)
            .is_some_and(|group| self.buffer.remove_group(group))
    }

    /// Reattaches the group of `id` at its original position.
    pub fn reinsert_group(&mut self, id: &str) -> bool {
        self.groups
            .group_for_id(id)
            .is_some_and(|group| self.buffer.reinsert_group(group))
    }

    /// Returns the live fragments of `id` in append order.
    pub fn rules_for_id(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.groups
            .group_for_id(id)
            .into_iter()
            .flat_map(|group| self.buffer.group_rules(group))
    }

    /// Concatenates every live fragment, in group order then append order.
    #[must_use]
    pub fn materialize(&self) -> String {
        self.buffer.materialize()
    }

    /// Returns every component id that owns a group, in group order.
    pub fn touched_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.groups.iter().map(|(_, id)| id)
    }

    /// Returns the shared id strings of every group, in group order.
    #[must_use]
    pub fn touched_ids_shared(&self) -> Vec<Arc<str>> {
        (0..self.groups.group_bound())
            .filter_map(|index| {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "group indices are bounded by u32 on allocation"
                )]
                let group = GroupId::new(index as u32);
                self.groups.shared_id_for_group(group).cloned()
            })
            .collect()
    }

    /// Drops every group, fragment and name.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.groups.clear();
        self.names.clear();
    }

    pub(crate) fn seed_group(&mut self, id: &str, group: GroupId) -> GroupId {
        let group = self.groups.seed(id, group);
        self.buffer.allocate(group);
        group
    }

    fn names_for_group_mut(&mut self, group: GroupId) -> &mut NameSet {
        let index = group.as_usize();
        if self.names.len() <= index {
            self.names.resize_with(index + 1, NameSet::default);
        }
        &mut self.names[index]
    }
}
