// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Group allocation for component ids.
//!
//! Every component id that injects CSS owns exactly one group in a
//! [`StyleSheet`](crate::StyleSheet). Groups are dense indices handed out in
//! first-allocation order, and that order is the order in which groups are
//! materialized.
//!
//! ## Example
//!
//! ```rust
//! use understory_sheet::{GroupAllocator, GroupId};
//!
//! let mut groups = GroupAllocator::new();
//! let button = groups.allocate("Button-a1b2");
//! let link = groups.allocate("Link-c3d4");
//!
//! // Allocation is idempotent.
//! assert_eq!(groups.allocate("Button-a1b2"), button);
//! assert_eq!(button, GroupId::new(0));
//! assert_eq!(link, GroupId::new(1));
//! assert_eq!(groups.id_for_group(link), Some("Link-c3d4"));
//! ```

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

/// A dense group index inside one sheet.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct GroupId(u32);

impl GroupId {
    /// Creates a group id from its raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns this id as a `usize` index (for tables keyed by group).
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw numeric id.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GroupId").field(&self.0).finish()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Maps component id strings to [`GroupId`]s.
///
/// Ids are stored once; the reverse table is indexed by group so that
/// `id_for_group` is a plain slice lookup. Seeded groups (from rehydration)
/// may leave holes in the reverse table; fresh allocations skip over any
/// index that is already taken.
#[derive(Debug, Clone, Default)]
pub struct GroupAllocator {
    by_group: Vec<Option<Arc<str>>>,
    by_id: HashMap<Arc<str>, GroupId>,
    next_free: u32,
}

impl GroupAllocator {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of allocated groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no group has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Returns the group for `id`, if one was allocated.
    #[must_use]
    pub fn group_for_id(&self, id: &str) -> Option<GroupId> {
        self.by_id.get(id).copied()
    }

    /// Returns the component id that owns `group`.
    #[must_use]
    pub fn id_for_group(&self, group: GroupId) -> Option<&str> {
        self.by_group
            .get(group.as_usize())
            .and_then(|slot| slot.as_deref())
    }

    /// Returns the shared id string that owns `group`.
    #[must_use]
    pub fn shared_id_for_group(&self, group: GroupId) -> Option<&Arc<str>> {
        self.by_group.get(group.as_usize()).and_then(Option::as_ref)
    }

    /// Allocates (or returns the existing) group for `id`.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` groups are allocated.
    pub fn allocate(&mut self, id: &str) -> GroupId {
        if let Some(group) = self.by_id.get(id) {
            return *group;
        }

        while self
            .by_group
            .get(self.next_free as usize)
            .is_some_and(Option::is_some)
        {
            self.next_free += 1;
        }
        let group = GroupId(self.next_free);
        self.next_free = self
            .next_free
            .checked_add(1)
            .expect("too many groups for GroupId (u32)");
        self.bind(Arc::from(id), group);
        group
    }

    /// Binds `id` to a specific group index.
    ///
    /// Used when restoring a sheet whose group numbering was recorded
    /// elsewhere. Returns the group actually bound: the existing group if
    /// `id` is already allocated, or a fresh one if `group` is owned by a
    /// different id.
    pub fn seed(&mut self, id: &str, group: GroupId) -> GroupId {
        if let Some(existing) = self.by_id.get(id) {
            return *existing;
        }
        if self.id_for_group(group).is_some() {
            return self.allocate(id);
        }
        self.bind(Arc::from(id), group);
        group
    }

    /// Returns an iterator over `(group, id)` pairs in group order.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &str)> + '_ {
        self.by_group.iter().enumerate().filter_map(|(index, slot)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "group indices are bounded by u32 on allocation"
            )]
            let group = GroupId(index as u32);
            slot.as_deref().map(|id| (group, id))
        })
    }

    /// Returns one past the highest allocated group index.
    #[must_use]
    pub fn group_bound(&self) -> usize {
        self.by_group.len()
    }

    /// Clears all groups.
    ///
    /// This invalidates any previously returned group ids.
    pub fn clear(&mut self) {
        self.by_group.clear();
        self.by_id.clear();
        self.next_free = 0;
    }

    fn bind(&mut self, id: Arc<str>, group: GroupId) {
        let index = group.as_usize();
        if self.by_group.len() <= index {
            self.by_group.resize(index + 1, None);
        }
        self.by_group[index] = Some(id.clone());
        self.by_id.insert(id, group);
    }
}
