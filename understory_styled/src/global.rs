// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The process-wide default registry and identity allocator.
//!
//! Convenient for hosts with a single scope. Hosts that render isolated
//! scopes concurrently (one request per thread, say) should create their own
//! [`StyleRegistry`] values instead; nothing here is shared with them.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::debug;

use crate::identity::IdentityAllocator;
use crate::registry::StyleRegistry;

static REGISTRY: OnceLock<Mutex<StyleRegistry>> = OnceLock::new();
static IDENTITIES: OnceLock<Mutex<IdentityAllocator>> = OnceLock::new();

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the process-wide registry, creating it on first use.
pub fn current() -> &'static Mutex<StyleRegistry> {
    REGISTRY.get_or_init(|| Mutex::new(StyleRegistry::new()))
}

/// Runs `f` with exclusive access to the process-wide registry.
///
/// ```rust
/// use understory_styled::{ExecutionContext, RuleSet, global, styled};
///
/// let title = styled("h1")
///     .unwrap()
///     .styles(RuleSet::new(["font-size: 2em;".into()]))
///     .unwrap();
/// let class = global::with_current(|registry| {
///     title.class_name(registry, &ExecutionContext::default())
/// })
/// .unwrap();
/// assert!(class.starts_with(title.id().as_str()));
/// assert!(global::with_current(|registry| registry.materialize()).contains("font-size:2em"));
/// ```
pub fn with_current<R>(f: impl FnOnce(&mut StyleRegistry) -> R) -> R {
    f(&mut lock(current()))
}

/// Runs `f` with exclusive access to the process-wide identity allocator.
pub fn with_identities<R>(f: impl FnOnce(&mut IdentityAllocator) -> R) -> R {
    let identities = IDENTITIES.get_or_init(|| Mutex::new(IdentityAllocator::new()));
    f(&mut lock(identities))
}

/// Resets the process-wide registry.
///
/// Component identities survive, so components built before the reset keep
/// working and resolve to the same names as before.
pub fn reset() {
    with_current(StyleRegistry::reset);
    debug!("process-wide registry reset");
}
