// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::string::String;

/// Errors raised while constructing components or resolving their styles.
///
/// Both variants are deterministic: retrying the same call with the same
/// inputs reproduces the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    /// A required identity was not supplied when creating a component.
    #[error("cannot create a styled component for target {target:?}: {reason}")]
    InvalidTarget {
        /// The offending target or id, as given.
        target: String,
        /// What was missing.
        reason: &'static str,
    },
    /// An interpolation had a shape the flattener does not accept.
    #[error("unsupported interpolation kind: {kind}")]
    UnsupportedInterpolationKind {
        /// A short description of the rejected shape.
        kind: &'static str,
    },
}

impl StyleError {
    pub(crate) fn invalid_target(target: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason,
        }
    }

    pub(crate) fn unsupported(kind: &'static str) -> Self {
        Self::UnsupportedInterpolationKind { kind }
    }
}
