// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Group-indexed view over a flat [`Tag`].
//!
//! [`GroupedBuffer`] keeps one size counter per group. The absolute index of a
//! group's first rule is the sum of the sizes of all groups before it, so
//! appending to group `g` inserts right before group `g + 1` starts and never
//! moves rules of earlier groups.
//!
//! Each group follows a small state machine:
//!
//! ```text
//! absent -> Allocated -> Populated <-> Cleared
//!              \____________|_____________/
//!                           v
//!                        Removed -> (reinsert) -> Allocated | Populated
//! ```
//!
//! A removed group keeps its slot. Its fragments move into a stash; appends
//! made while it is removed are stashed after them, and reinsertion puts the
//! whole stash back at the group's position.

use alloc::string::String;
use alloc::vec::Vec;

use crate::group::GroupId;
use crate::tag::{Tag, VirtualTag};

/// Lifecycle state of a group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupState {
    /// The group has a slot but never received fragments.
    Allocated,
    /// The group holds at least one live fragment.
    Populated,
    /// The group's fragments were dropped; its slot is kept.
    Cleared,
    /// The group is detached; its fragments wait in a stash.
    Removed,
}

#[derive(Clone, Debug, Default)]
struct GroupSlot {
    state: Option<GroupState>,
    size: usize,
    stash: Vec<String>,
}

/// Rules of a flat [`Tag`], partitioned into ordered groups.
#[derive(Clone, Debug, Default)]
pub struct GroupedBuffer<T = VirtualTag> {
    tag: T,
    groups: Vec<GroupSlot>,
}

impl GroupedBuffer<VirtualTag> {
    /// Creates an empty buffer over a [`VirtualTag`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Tag> GroupedBuffer<T> {
    /// Creates an empty buffer writing through to `tag`.
    ///
    /// The tag should be empty: rule indices are computed from group sizes
    /// alone, so pre-existing rules would be attributed to the first groups.
    #[must_use]
    pub fn with_tag(tag: T) -> Self {
        Self {
            tag,
            groups: Vec::new(),
        }
    }

    /// Returns the underlying tag.
    #[must_use]
    pub fn tag(&self) -> &T {
        &self.tag
    }

    /// Returns one past the highest group index that has a slot.
    #[must_use]
    pub fn group_bound(&self) -> usize {
        self.groups.len()
    }

    /// Makes sure `group` has a slot. Idempotent.
    pub fn allocate(&mut self, group: GroupId) {
        let slot = self.slot_mut(group);
        if slot.state.is_none() {
            slot.state = Some(GroupState::Allocated);
        }
    }

    /// Returns the state of `group`, or `None` if it was never allocated.
    #[must_use]
    pub fn group_state(&self, group: GroupId) -> Option<GroupState> {
        self.groups.get(group.as_usize()).and_then(|slot| slot.state)
    }

    /// Returns the number of live fragments in `group`.
    #[must_use]
    pub fn group_len(&self, group: GroupId) -> usize {
        self.groups.get(group.as_usize()).map_or(0, |slot| slot.size)
    }

    /// Appends `rules` at the end of `group`.
    ///
    /// Returns the number of fragments that became live. Fragments appended
    /// to a removed group are stashed and count as zero here.
    pub fn insert_rules<I, S>(&mut self, group: GroupId, rules: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allocate(group);
        let index = group.as_usize();

        if self.groups[index].state == Some(GroupState::Removed) {
            let stash = &mut self.groups[index].stash;
            stash.extend(rules.into_iter().map(|rule| String::from(rule.as_ref())));
            return 0;
        }

        let mut at = self.end_of(group);
        let mut inserted = 0;
        for rule in rules {
            if self.tag.insert_rule(at, rule.as_ref()) {
                at += 1;
                inserted += 1;
            }
        }

        let slot = &mut self.groups[index];
        slot.size += inserted;
        if slot.size > 0 {
            slot.state = Some(GroupState::Populated);
        }
        inserted
    }

    /// Drops every fragment of `group` but keeps its slot and position.
    pub fn clear_group(&mut self, group: GroupId) {
        let index = group.as_usize();
        match self.group_state(group) {
            None => {}
            Some(GroupState::Removed) => self.groups[index].stash.clear(),
            Some(_) => {
                let start = self.start_of(group);
                for _ in 0..self.groups[index].size {
                    self.tag.delete_rule(start);
                }
                let slot = &mut self.groups[index];
                slot.size = 0;
                slot.state = Some(GroupState::Cleared);
            }
        }
    }

    /// Detaches `group`, stashing its fragments.
    ///
    /// Returns `false` if the group is absent or already removed.
    pub fn remove_group(&mut self, group: GroupId) -> bool {
        match self.group_state(group) {
            None | Some(GroupState::Removed) => false,
            Some(_) => {
                let start = self.start_of(group);
                let size = self.groups[group.as_usize()].size;
                let mut stash = Vec::with_capacity(size);
                for _ in 0..size {
                    if let Some(rule) = self.tag.get_rule(start) {
                        stash.push(String::from(rule));
                    }
                    self.tag.delete_rule(start);
                }
                let slot = &mut self.groups[group.as_usize()];
                slot.size = 0;
                slot.stash = stash;
                slot.state = Some(GroupState::Removed);
                true
            }
        }
    }

    /// Reattaches a removed `group` at its original position.
    ///
    /// Returns `false` if the group was not removed.
    pub fn reinsert_group(&mut self, group: GroupId) -> bool {
        if self.group_state(group) != Some(GroupState::Removed) {
            return false;
        }
        let slot = &mut self.groups[group.as_usize()];
        let stash = core::mem::take(&mut slot.stash);
        slot.state = Some(GroupState::Allocated);
        self.insert_rules(group, stash);
        true
    }

    /// Returns the live fragments of `group` in append order.
    pub fn group_rules(&self, group: GroupId) -> impl Iterator<Item = &str> + '_ {
        let start = self.start_of(group);
        let end = start + self.group_len(group);
        (start..end).filter_map(|index| self.tag.get_rule(index))
    }

    /// Concatenates every live fragment, in group order then append order.
    #[must_use]
    pub fn materialize(&self) -> String {
        let mut css = String::new();
        for index in 0..self.tag.len() {
            if let Some(rule) = self.tag.get_rule(index) {
                css.push_str(rule);
            }
        }
        css
    }

    /// Drops every group and every fragment.
    pub fn clear(&mut self) {
        for _ in 0..self.tag.len() {
            self.tag.delete_rule(0);
        }
        self.groups.clear();
    }

    fn slot_mut(&mut self, group: GroupId) -> &mut GroupSlot {
        let index = group.as_usize();
        if self.groups.len() <= index {
            self.groups.resize_with(index + 1, GroupSlot::default);
        }
        &mut self.groups[index]
    }

    fn start_of(&self, group: GroupId) -> usize {
        self.groups
            .iter()
            .take(group.as_usize())
            .map(|slot| slot.size)
            .sum()
    }

    fn end_of(&self, group: GroupId) -> usize {
        self.start_of(group) + self.group_len(group)
    }
}
