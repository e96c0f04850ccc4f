// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property naming and value units for style objects.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;

/// Properties whose numeric values are emitted without a unit.
///
/// Sorted, hyphenated.
const UNITLESS: &[&str] = &[
    "animation-iteration-count",
    "aspect-ratio",
    "border-image-outset",
    "border-image-slice",
    "border-image-width",
    "box-flex",
    "box-flex-group",
    "box-ordinal-group",
    "column-count",
    "columns",
    "fill-opacity",
    "flex",
    "flex-grow",
    "flex-negative",
    "flex-order",
    "flex-positive",
    "flex-shrink",
    "flood-opacity",
    "font-weight",
    "grid-area",
    "grid-column",
    "grid-column-end",
    "grid-column-span",
    "grid-column-start",
    "grid-row",
    "grid-row-end",
    "grid-row-span",
    "grid-row-start",
    "line-clamp",
    "line-height",
    "opacity",
    "order",
    "orphans",
    "scale",
    "stop-opacity",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "tab-size",
    "widows",
    "z-index",
    "zoom",
];

/// Returns `true` for CSS custom properties (`--name`).
#[must_use]
pub fn is_custom_property(name: &str) -> bool {
    name.starts_with("--")
}

/// Converts a camelCase property name to its hyphenated CSS form.
///
/// Custom properties are returned unchanged, and a leading `ms-` becomes the
/// vendor prefix `-ms-`.
///
/// ```rust
/// use understory_styled::hyphenate;
///
/// assert_eq!(hyphenate("backgroundColor"), "background-color");
/// assert_eq!(hyphenate("msTransition"), "-ms-transition");
/// assert_eq!(hyphenate("WebkitBoxShadow"), "-webkit-box-shadow");
/// assert_eq!(hyphenate("--accentColor"), "--accentColor");
/// assert_eq!(hyphenate("margin-top"), "margin-top");
/// ```
#[must_use]
pub fn hyphenate(name: &str) -> Cow<'_, str> {
    if is_custom_property(name) || !name.bytes().any(|b| b.is_ascii_uppercase()) {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    if out.starts_with("ms-") {
        out.insert(0, '-');
    }
    Cow::Owned(out)
}

/// Returns `true` if numeric values of `property` take no unit.
///
/// Vendor prefixes are ignored, so `-webkit-line-clamp` is unitless too.
#[must_use]
pub fn is_unitless(property: &str) -> bool {
    let property = hyphenate(property);
    let bare = strip_vendor_prefix(&property);
    UNITLESS.binary_search(&bare).is_ok()
}

fn strip_vendor_prefix(property: &str) -> &str {
    ["-webkit-", "-moz-", "-ms-", "-o-"]
        .iter()
        .find_map(|prefix| property.strip_prefix(prefix))
        .unwrap_or(property)
}

/// Formats a numeric value for `property`, appending `px` where needed.
///
/// Zero, unitless properties and custom properties never get a unit.
///
/// ```rust
/// use understory_styled::add_unit_if_needed;
///
/// assert_eq!(add_unit_if_needed("width", 10.0), "10px");
/// assert_eq!(add_unit_if_needed("width", 0.0), "0");
/// assert_eq!(add_unit_if_needed("lineHeight", 1.5), "1.5");
/// assert_eq!(add_unit_if_needed("--gap", 4.0), "4");
/// ```
#[must_use]
pub fn add_unit_if_needed(property: &str, value: f64) -> String {
    if value == 0.0 || is_custom_property(property) || is_unitless(property) {
        format!("{value}")
    } else {
        format!("{value}px")
    }
}
