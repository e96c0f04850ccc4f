// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Sheet: a group-indexed, append-only CSS injection buffer.
//!
//! This crate stores opaque CSS fragments on behalf of style generators such
//! as `understory_styled`. It knows nothing about how the CSS was produced;
//! it only guarantees where fragments end up.
//!
//! ## Core Concepts
//!
//! ### Groups
//!
//! Every component id owns one group, allocated on first use by a
//! [`GroupAllocator`]. Groups are materialized in allocation order, and each
//! group's fragments in append order. Appending to one group never moves the
//! fragments of another.
//!
//! ### Tags
//!
//! A [`Tag`] is the flat, index-addressed list of rules that a
//! [`GroupedBuffer`] writes through to. [`VirtualTag`] keeps rules in memory;
//! a host can implement [`Tag`] over a live stylesheet to mirror the buffer.
//!
//! ### Sheets
//!
//! [`StyleSheet`] binds component ids to groups and remembers which class
//! names were injected for each id:
//!
//! ```rust
//! use understory_sheet::{GroupState, StyleSheet};
//!
//! let mut sheet = StyleSheet::new();
//! sheet.insert_rules("Title-x1", "hjk", [".hjk{font-size:2em;}"]);
//! sheet.insert_rules("Body-y2", "mnp", [".mnp{margin:0;}"]);
//! sheet.insert_rules("Title-x1", "qrs", [".qrs{font-size:3em;}"]);
//!
//! // Group order first, then append order.
//! assert_eq!(
//!     sheet.materialize(),
//!     ".hjk{font-size:2em;}.qrs{font-size:3em;}.mnp{margin:0;}"
//! );
//!
//! // Groups can be detached and restored without disturbing their siblings.
//! sheet.remove_group("Title-x1");
//! assert_eq!(sheet.group_state("Title-x1"), Some(GroupState::Removed));
//! assert_eq!(sheet.materialize(), ".mnp{margin:0;}");
//! sheet.reinsert_group("Title-x1");
//! assert_eq!(
//!     sheet.materialize(),
//!     ".hjk{font-size:2em;}.qrs{font-size:3em;}.mnp{margin:0;}"
//! );
//! ```
//!
//! ### Extraction and rehydration
//!
//! [`StyleSheet::marked_output`] renders the sheet with marker rules so that
//! a sheet produced without a live document (server rendering) can later be
//! restored with [`StyleSheet::rehydrate`].
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` feature (on by default)
//! only forwards to `tracing`.

#![no_std]

extern crate alloc;

mod buffer;
mod group;
mod output;
mod sheet;
mod tag;

pub use buffer::{GroupState, GroupedBuffer};
pub use group::{GroupAllocator, GroupId};
pub use output::{RehydrateSummary, SPLITTER};
pub use sheet::StyleSheet;
pub use tag::{Tag, VirtualTag};
