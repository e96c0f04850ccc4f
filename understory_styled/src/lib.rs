// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Styled: content-addressed style resolution for styled components.
//!
//! A styled component declares its styling as a [`RuleSet`]: static CSS text
//! interleaved with functions of an [`ExecutionContext`] (props plus theme),
//! style objects, nested rule sets, [`Keyframes`] and references to other
//! components. This crate turns a rule set and a context into a class name,
//! and injects the CSS behind that name exactly once.
//!
//! ## Pipeline
//!
//! 1. [`flatten`] reduces the rule set, depth first, to ordered CSS text.
//! 2. A [`Fingerprint`] hashes the component id, the active
//!    [`Stringifier`] configuration and that text.
//! 3. The [`StyleRegistry`] looks the fingerprint up. On a miss it mints a
//!    [`ClassName`], asks the [`Stringifier`] for the scoped CSS and appends
//!    it to the component's group in its [`understory_sheet::StyleSheet`].
//!
//! ```rust
//! use serde_json::json;
//! use understory_styled::{
//!     ExecutionContext, IdentityAllocator, Interpolation, StyleRegistry, rule_set,
//! };
//!
//! let mut ids = IdentityAllocator::new();
//! let title = ids.generate(Some("Title"), None);
//! let rules = rule_set![
//!     "color: ",
//!     Interpolation::function(|cx: &ExecutionContext| cx.theme()["primary"].clone()),
//!     ";",
//! ];
//!
//! let mut registry = StyleRegistry::new();
//! let red = ExecutionContext::new(json!({ "primary": "red" }));
//! let blue = ExecutionContext::new(json!({ "primary": "blue" }));
//!
//! let a = registry.resolve(&title, &rules, &red).unwrap().unwrap();
//! let b = registry.resolve(&title, &rules, &blue).unwrap().unwrap();
//! assert_eq!(a, registry.resolve(&title, &rules, &red).unwrap().unwrap());
//! assert_ne!(a, b);
//! assert_eq!(registry.sheet().rules_for_id(title.as_str()).count(), 2);
//! ```
//!
//! ## Components
//!
//! [`styled`] and [`Construct`] build [`StyledComponent`]s with attrs,
//! display names and extension of other styled components. Rendering one
//! yields the full class list: the stable component ids (ancestors first),
//! then the generated names.
//!
//! ## Scopes
//!
//! A [`StyleRegistry`] is one isolated scope. [`StyleRegistry::seal`] takes
//! a read-only snapshot for server rendering, [`StyleRegistry::rehydrate`]
//! reads it back on the client, and [`StyleRegistry::reset`] starts over.
//! With the `std` feature (on by default) the [`global`] module offers a
//! process-wide registry for single-scope hosts.
//!
//! ## Transformers
//!
//! With the `std` feature the default [`Stringifier`] uses
//! `LightningTransformer`, which lowers nesting, minifies and
//! vendor-prefixes through `lightningcss`. [`NestingTransformer`] is the
//! dependency-free alternative.
//!
//! ## `no_std` Support
//!
//! Without the `std` feature this crate is `no_std` and uses `alloc`. The
//! default [`Stringifier`] then uses [`NestingTransformer`].

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod advisory;
mod component;
mod context;
mod error;
mod flatten;
mod hash;
mod identity;
mod interpolation;
mod keyframes;
#[cfg(feature = "std")]
mod lightning;
mod object;
mod registry;
mod stringify;
mod styled;
mod transform;

#[cfg(feature = "std")]
pub mod global;

pub use advisory::Advisory;
pub use component::ComponentStyle;
pub use context::{ExecutionContext, THEME_KEY};
pub use error::StyleError;
pub use flatten::{Flattened, flatten, is_static};
pub use hash::{ClassName, Fingerprint, alphabetic_name, component_id_hash};
pub use identity::{ComponentId, IdentityAllocator, IdentityChain, escape, fold_identities};
pub use interpolation::{ComponentRef, Interpolation, RuleSet, StyleFn, StyleObject, StyleValue, css};
pub use keyframes::Keyframes;
#[cfg(feature = "std")]
pub use lightning::{LightningTransformer, LightningTransformerBuilder};
#[cfg(feature = "std")]
pub use lightningcss::targets::Browsers;
pub use object::{add_unit_if_needed, hyphenate, is_custom_property, is_unitless};
pub use registry::{
    DEFAULT_WARN_THRESHOLD, RegistryOptions, RegistryOptionsBuilder, SealedStyles, StyleRegistry,
};
pub use stringify::Stringifier;
pub use styled::{
    Attrs, AttrsFn, Construct, Rendered, StyledComponent, StyledOptions, StyledTarget, styled,
};
pub use transform::{CssTransformer, NestingTransformer, NestingTransformerBuilder, SelectorContext};

/// Builds a [`RuleSet`] from a list of values convertible to [`Interpolation`].
///
/// ```rust
/// use understory_styled::{ExecutionContext, flatten, rule_set};
///
/// let rules = rule_set!["margin: ", 0_i64, ";"];
/// assert_eq!(flatten(&rules, &ExecutionContext::default()).unwrap().css(), "margin: 0;");
/// ```
#[macro_export]
macro_rules! rule_set {
    ($($item:expr),* $(,)?) => {
        $crate::RuleSet::new([$($crate::Interpolation::from($item)),*])
    };
}
