// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`CssTransformer`] backed by `lightningcss`.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::{String, ToString};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Features, Targets};
use tracing::warn;

use crate::hash::truncate_hash;
use crate::transform::{
    CssTransformer, NestingTransformer, NestingTransformerBuilder, SelectorContext,
    mark_repeated_self_references, root_selector, strip_comments,
};

/// The default transformer with the `std` feature.
///
/// The flattened text is wrapped in the owning selector and run through
/// `lightningcss`: nesting is always lowered to plain rules, and
/// declarations are minified, merged and vendor-prefixed for the configured
/// [`Browsers`]. Repeated `&` references in a first-level nested selector
/// after the first match the component id, as with [`NestingTransformer`].
///
/// Only style rules and conditional group rules (`@media`, `@supports`,
/// `@container`, `@layer`) nest. Other at-rules inside component rules
/// (`@font-face`, `@import`) are dropped; [`NestingTransformer`] hoists
/// them instead.
///
/// Text `lightningcss` cannot print is handed to [`NestingTransformer`]
/// with the same namespace, and a warning is logged.
///
/// ```rust
/// use understory_styled::{Browsers, CssTransformer, LightningTransformerBuilder, SelectorContext};
///
/// let transformer = LightningTransformerBuilder::new()
///     .browsers(Browsers {
///         safari: Some(13 << 16),
///         ..Browsers::default()
///     })
///     .build();
/// let css = transformer.transform(
///     "user-select: none; &:hover { color: red; }",
///     &SelectorContext {
///         selector: ".abc",
///         prefix: None,
///         component_id: "Button-x1",
///     },
/// );
/// assert!(css.contains("-webkit-user-select:none"));
/// assert!(css.contains(".abc:hover{color:red}"));
/// ```
#[derive(Clone, Debug)]
pub struct LightningTransformer {
    browsers: Option<Browsers>,
    namespace: Option<String>,
    minify: bool,
}

impl Default for LightningTransformer {
    fn default() -> Self {
        Self {
            browsers: None,
            namespace: None,
            minify: true,
        }
    }
}

impl LightningTransformer {
    /// Returns the browser targets, if any.
    #[must_use]
    pub fn browsers(&self) -> Option<Browsers> {
        self.browsers
    }

    /// Returns the namespace selector, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns whether output is minified.
    #[must_use]
    pub fn minify(&self) -> bool {
        self.minify
    }

    fn targets(&self) -> Targets {
        Targets {
            browsers: self.browsers,
            include: Features::Nesting,
            ..Targets::default()
        }
    }

    fn print(&self, source: &str) -> Result<String, String> {
        let options = ParserOptions {
            error_recovery: true,
            ..ParserOptions::default()
        };
        let mut sheet = StyleSheet::parse(source, options).map_err(|error| error.to_string())?;
        sheet
            .minify(MinifyOptions {
                targets: self.targets(),
                ..MinifyOptions::default()
            })
            .map_err(|error| format!("{error:?}"))?;
        let printed = sheet
            .to_css(PrinterOptions {
                minify: self.minify,
                targets: self.targets(),
                ..PrinterOptions::default()
            })
            .map_err(|error| format!("{error:?}"))?;
        Ok(printed.code.trim().to_string())
    }

    fn fallback(&self) -> NestingTransformer {
        let builder = NestingTransformerBuilder::new();
        match &self.namespace {
            Some(namespace) => builder.namespace(namespace.clone()).build(),
            None => builder.build(),
        }
    }
}

impl CssTransformer for LightningTransformer {
    fn transform(&self, css: &str, cx: &SelectorContext<'_>) -> String {
        let stripped = strip_comments(css);
        if stripped.trim().is_empty() {
            return String::new();
        }
        let source = match cx.prefix.filter(|prefix| prefix.starts_with('@')) {
            Some(at_rule) => format!("{at_rule} {}{{{stripped}}}", cx.selector),
            None => {
                let root = root_selector(self.namespace.as_deref(), cx);
                let body = if cx.component_id.is_empty() {
                    Cow::Borrowed(&*stripped)
                } else {
                    mark_repeated_self_references(&stripped, &format!(".{}", cx.component_id))
                };
                format!("{root}{{{body}}}")
            }
        };
        match self.print(&source) {
            Ok(out) => out,
            Err(error) => {
                warn!(
                    selector = cx.selector,
                    %error,
                    "lightningcss could not print the rules; using the nesting transformer",
                );
                self.fallback().transform(css, cx)
            }
        }
    }

    fn configuration_hash(&self) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"understory_styled::LightningTransformer/1");
        match &self.namespace {
            Some(namespace) => {
                hasher.update(&[1]);
                hasher.update(&(namespace.len() as u64).to_le_bytes());
                hasher.update(namespace.as_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        hasher.update(&[u8::from(self.minify)]);
        match &self.browsers {
            Some(browsers) => {
                hasher.update(&[1]);
                for version in [
                    browsers.android,
                    browsers.chrome,
                    browsers.edge,
                    browsers.firefox,
                    browsers.ie,
                    browsers.ios_saf,
                    browsers.opera,
                    browsers.safari,
                    browsers.samsung,
                ] {
                    hasher.update(&version.map_or(u64::MAX, u64::from).to_le_bytes());
                }
            }
            None => {
                hasher.update(&[0]);
            }
        }
        truncate_hash(&hasher.finalize())
    }
}

/// Builder for [`LightningTransformer`].
#[derive(Clone, Debug, Default)]
pub struct LightningTransformerBuilder {
    inner: LightningTransformer,
}

impl LightningTransformerBuilder {
    /// Creates a builder with default settings: no browser targets, no
    /// namespace, minified output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the browsers that output must support.
    ///
    /// Versions are encoded as `major << 16 | minor << 8 | patch`.
    #[must_use]
    pub fn browsers(mut self, browsers: Browsers) -> Self {
        self.inner.browsers = Some(browsers);
        self
    }

    /// Prepends `namespace` to every scoped selector.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.inner.namespace = (!namespace.trim().is_empty()).then_some(namespace);
        self
    }

    /// Minifies output. On by default.
    #[must_use]
    pub fn minify(mut self, enabled: bool) -> Self {
        self.inner.minify = enabled;
        self
    }

    /// Builds the transformer.
    #[must_use]
    pub fn build(self) -> LightningTransformer {
        self.inner
    }
}
