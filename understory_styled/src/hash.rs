// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content fingerprints and minted class names.

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use core::ops::Deref;

const ALPHABET_LEN: u64 = 52;

/// Truncates a BLAKE3 digest to its first 64 bits (little endian).
pub(crate) fn truncate_hash(hash: &blake3::Hash) -> u64 {
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

fn update_field(hasher: &mut blake3::Hasher, tag: u8, bytes: &[u8]) {
    hasher.update(&[tag]);
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// A deterministic 64-bit hash of one resolved style.
///
/// The inputs are the owning component id, the configuration hash of the
/// active stringifier, and the flattened CSS text. Each input is tagged and
/// length-prefixed, so no two distinct input triples share an encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Computes the fingerprint of a resolved style.
    #[must_use]
    pub fn of(component_id: &str, configuration: u64, css: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"understory_styled::Fingerprint/1");
        update_field(&mut hasher, b'i', component_id.as_bytes());
        update_field(&mut hasher, b'c', &configuration.to_le_bytes());
        update_field(&mut hasher, b's', css.as_bytes());
        Self(truncate_hash(&hasher.finalize()))
    }

    /// Returns the raw hash value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Mints the class name encoding this fingerprint.
    #[must_use]
    pub fn class_name(self) -> ClassName {
        ClassName(alphabetic_name(self.0).into())
    }
}

/// A generated, selector-safe CSS class name.
///
/// Cloning is cheap (`Arc`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName(Arc<str>);

impl ClassName {
    /// Returns the name as a string slice.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the shared name.
    #[must_use]
    pub fn shared(&self) -> &Arc<str> {
        &self.0
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self(name.into())
    }
}

impl Deref for ClassName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ClassName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for ClassName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes `code` in base 52 using `a-z` then `A-Z`.
///
/// Any `ad` pair (in either case) is split with a `-`, so generated names
/// never contain the substring `ad`, which content blockers tend to hide.
///
/// ```rust
/// use understory_styled::alphabetic_name;
///
/// assert_eq!(alphabetic_name(0), "a");
/// assert_eq!(alphabetic_name(51), "Z");
/// assert_eq!(alphabetic_name(52), "ba");
/// assert_eq!(alphabetic_name(52 * 52 + 3), "ba-d");
/// ```
#[must_use]
pub fn alphabetic_name(code: u64) -> String {
    let mut reversed = String::new();
    let mut x = code;
    loop {
        reversed.push(alphabetic_char(x % ALPHABET_LEN));
        x /= ALPHABET_LEN;
        if x == 0 {
            break;
        }
    }

    let mut name = String::with_capacity(reversed.len() + 2);
    let mut previous = None;
    for c in reversed.chars().rev() {
        if matches!(previous, Some('a' | 'A')) && matches!(c, 'd' | 'D') {
            name.push('-');
        }
        name.push(c);
        previous = Some(c);
    }
    name
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the argument is always below 52"
)]
fn alphabetic_char(code: u64) -> char {
    let code = code as u8;
    if code < 26 {
        char::from(b'a' + code)
    } else {
        char::from(b'A' + code - 26)
    }
}

/// Hashes a component id seed to 32 bits.
#[expect(
    clippy::cast_possible_truncation,
    reason = "component id suffixes only need 32 bits"
)]
#[must_use]
pub fn component_id_hash(seed: &str) -> u32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"understory_styled::ComponentId/1");
    hasher.update(seed.as_bytes());
    truncate_hash(&hasher.finalize()) as u32
}
