// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Non-fatal advisories recorded by a registry.

use alloc::sync::Arc;
use core::fmt;

/// Something worth surfacing that does not change behavior.
///
/// Each advisory is recorded at most once per registry (per component id for
/// [`TooManyClasses`](Self::TooManyClasses)), logged at `warn` level, and
/// kept until drained with
/// [`StyleRegistry::take_advisories`](crate::StyleRegistry::take_advisories).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// A component has injected more class variants than the threshold.
    ///
    /// This usually means a continuously varying value is interpolated
    /// directly into the styles.
    TooManyClasses {
        /// The component id.
        component_id: Arc<str>,
        /// The threshold that was crossed.
        threshold: u32,
    },
    /// The active stringifier differs from the one the registry recorded.
    ///
    /// Resolution proceeds; fingerprints under either configuration stay
    /// distinct.
    ConfigurationMismatch {
        /// The configuration hash recorded at creation (or the last reset).
        recorded: u64,
        /// The configuration hash now in use.
        active: u64,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyClasses {
                component_id,
                threshold,
            } => write!(
                f,
                "over {threshold} classes were generated for component {component_id}; \
                 consider passing frequently changing values as inline styles"
            ),
            Self::ConfigurationMismatch { recorded, active } => write!(
                f,
                "stringifier configuration changed from {recorded:#018x} to {active:#018x} \
                 without a registry reset"
            ),
        }
    }
}
