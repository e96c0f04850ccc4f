// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Marked extraction output and rehydration.
//!
//! [`StyleSheet::materialize`] yields bare CSS. For server rendering the sheet
//! also needs to be read back later, so [`StyleSheet::marked_output`] follows
//! every group with a marker rule recording its group index, its component
//! id, and the class names registered for it:
//!
//! ```text
//! .abc{color:red;}/*!sc*/
//! data-styled.g0[id="Button-a1"]{content:"abc,"}/*!sc*/
//! ```
//!
//! [`StyleSheet::rehydrate`] parses that text back into groups, fragments and
//! names. Markers that do not parse are skipped along with the fragments that
//! precede them.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use tracing::debug;

use crate::group::GroupId;
use crate::sheet::StyleSheet;
use crate::tag::Tag;

/// Separator written after every fragment and marker.
pub const SPLITTER: &str = "/*!sc*/\n";

const MARKER_PREFIX: &str = "data-styled.g";

/// Counts reported by [`StyleSheet::rehydrate`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RehydrateSummary {
    /// Groups restored from markers.
    pub groups: usize,
    /// Fragments restored into those groups.
    pub fragments: usize,
    /// Names registered from markers.
    pub names: usize,
    /// Markers that could not be parsed.
    pub skipped: usize,
    /// Markers whose recorded group index was out of range and that were
    /// bound to a fresh group instead.
    pub remapped: usize,
}

struct Marker<'a> {
    group: GroupId,
    id: &'a str,
    names: &'a str,
}

fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let rest = line.trim().strip_prefix(MARKER_PREFIX)?;
    let digits = rest.find(|c: char| !c.is_ascii_digit())?;
    let group: u32 = rest[..digits].parse().ok()?;
    let rest = rest[digits..].strip_prefix("[id=\"")?;
    let id_end = rest.find('"')?;
    let id = &rest[..id_end];
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return None;
    }
    let rest = rest[id_end..].strip_prefix("\"]")?;
    let content = rest.find("content:\"")?;
    let rest = &rest[content + "content:\"".len()..];
    let names_end = rest.find('"')?;
    Some(Marker {
        group: GroupId::new(group),
        id,
        names: &rest[..names_end],
    })
}

impl<T: Tag> StyleSheet<T> {
    /// Renders every group followed by its marker rule.
    ///
    /// Groups without registered names or without live fragments are
    /// omitted, matching what [`rehydrate`](Self::rehydrate) can restore.
    #[must_use]
    pub fn marked_output(&self) -> String {
        let mut css = String::new();
        for (group, id) in self.groups().iter() {
            let mut names = self.names_for_group(group).peekable();
            if names.peek().is_none() {
                continue;
            }
            let mut rules = self.buffer().group_rules(group).peekable();
            if rules.peek().is_none() {
                continue;
            }

            for rule in rules {
                css.push_str(rule);
                css.push_str(SPLITTER);
            }
            css.push_str(&format!(
                "{MARKER_PREFIX}{}[id=\"{id}\"]{{content:\"",
                group.as_u32()
            ));
            for name in names {
                css.push_str(name);
                css.push(',');
            }
            css.push_str("\"}");
            css.push_str(SPLITTER);
        }
        css
    }

    /// Restores groups, fragments and names from [`marked_output`](Self::marked_output) text.
    ///
    /// Groups are bound to their recorded indices when those are free, so
    /// the restored order matches the producing sheet. Recorded indices are
    /// only trusted up to the current group bound plus the number of markers
    /// in `text`; markers beyond that are bound to fresh groups in the order
    /// they appear.
    pub fn rehydrate(&mut self, text: &str) -> RehydrateSummary {
        let mut summary = RehydrateSummary::default();
        let mut pending: Vec<&str> = Vec::new();
        let limit = self.groups().group_bound() + text.matches(MARKER_PREFIX).count();

        for part in text.split(SPLITTER) {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with(MARKER_PREFIX) {
                pending.push(trimmed);
                continue;
            }

            let Some(marker) = parse_marker(trimmed) else {
                summary.skipped += 1;
                pending.clear();
                continue;
            };

            let group = if marker.group.as_usize() < limit {
                self.seed_group(marker.id, marker.group)
            } else {
                summary.remapped += 1;
                self.register_id(marker.id)
            };
            for name in marker.names.split(',').filter(|name| !name.is_empty()) {
                if self.register_name(marker.id, name) {
                    summary.names += 1;
                }
            }
            summary.fragments += self.insert_rules_for_group(group, pending.drain(..));
            summary.groups += 1;
        }

        debug!(
            groups = summary.groups,
            fragments = summary.fragments,
            names = summary.names,
            skipped = summary.skipped,
            remapped = summary.remapped,
            "rehydrated stylesheet"
        );
        summary
    }
}
