// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stringifier: flattened text to final CSS.

use alloc::string::String;
use alloc::sync::Arc;

use crate::transform::{CssTransformer, NestingTransformer, SelectorContext};

/// Turns flattened CSS text into final, scoped CSS.
///
/// Syntax work is delegated to a shared [`CssTransformer`]. Cloning is cheap.
/// The default uses `LightningTransformer` with the `std` feature and
/// [`NestingTransformer`] without it.
///
/// ```rust
/// use understory_styled::Stringifier;
///
/// let stringifier = Stringifier::nesting();
/// assert_eq!(
///     stringifier.stringify("color: red; &:focus { outline: none; }", ".x", None, "C-1"),
///     ".x{color:red;}.x:focus{outline:none;}"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Stringifier {
    transformer: Arc<dyn CssTransformer>,
}

impl Default for Stringifier {
    #[cfg(feature = "std")]
    fn default() -> Self {
        Self::new(crate::lightning::LightningTransformer::default())
    }

    #[cfg(not(feature = "std"))]
    fn default() -> Self {
        Self::nesting()
    }
}

impl Stringifier {
    /// Creates a stringifier over `transformer`.
    #[must_use]
    pub fn new(transformer: impl CssTransformer + 'static) -> Self {
        Self::from_shared(Arc::new(transformer))
    }

    /// Creates a stringifier over a default [`NestingTransformer`].
    #[must_use]
    pub fn nesting() -> Self {
        Self::new(NestingTransformer::default())
    }

    /// Creates a stringifier over an already shared transformer.
    #[must_use]
    pub fn from_shared(transformer: Arc<dyn CssTransformer>) -> Self {
        Self { transformer }
    }

    /// Returns the transformer.
    #[must_use]
    pub fn transformer(&self) -> &dyn CssTransformer {
        &*self.transformer
    }

    /// Produces the CSS for `css` placed under `selector`.
    ///
    /// Pure and deterministic: equal arguments give byte-identical output.
    #[must_use]
    pub fn stringify(
        &self,
        css: &str,
        selector: &str,
        prefix: Option<&str>,
        component_id: &str,
    ) -> String {
        self.transformer.transform(
            css,
            &SelectorContext {
                selector,
                prefix,
                component_id,
            },
        )
    }

    /// Returns the transformer's configuration hash.
    #[must_use]
    pub fn configuration_hash(&self) -> u64 {
        self.transformer.configuration_hash()
    }
}
