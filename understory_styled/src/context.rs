// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Execution contexts.
//!
//! An [`ExecutionContext`] is the props-plus-theme bundle that the dynamic
//! parts of a rule set are evaluated against. It is created per render and
//! only borrowed by the resolver.

use alloc::string::String;

use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// The key under which the theme travels alongside props.
pub const THEME_KEY: &str = "theme";

/// Caller props merged with a required theme.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use understory_styled::ExecutionContext;
///
/// let cx = ExecutionContext::from_value(json!({
///     "theme": { "primary": "red" },
///     "size": 3,
/// }));
///
/// assert_eq!(cx.theme()["primary"], "red");
/// assert_eq!(cx.prop("size"), &json!(3));
/// assert!(cx.prop("missing").is_null());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionContext {
    props: Map<String, Value>,
    theme: Value,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl ExecutionContext {
    /// Creates a context with no props and the given theme.
    #[must_use]
    pub fn new(theme: Value) -> Self {
        Self {
            props: Map::new(),
            theme,
        }
    }

    /// Splits a JSON object into props and theme.
    ///
    /// The `theme` key becomes the theme (an empty object if absent); every
    /// other key becomes a prop. A non-object value yields an empty context.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut props) = value else {
            return Self::default();
        };
        let theme = props
            .remove(THEME_KEY)
            .unwrap_or_else(|| Value::Object(Map::new()));
        Self { props, theme }
    }

    /// Returns this context with `props` merged over the existing ones.
    #[must_use]
    pub fn with_props(mut self, props: Map<String, Value>) -> Self {
        for (key, value) in props {
            self.set(key, value);
        }
        self
    }

    /// Returns the theme.
    #[must_use]
    #[inline]
    pub fn theme(&self) -> &Value {
        &self.theme
    }

    /// Replaces the theme.
    pub fn set_theme(&mut self, theme: Value) {
        self.theme = theme;
    }

    /// Returns all props (the theme is not included).
    #[must_use]
    #[inline]
    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    /// Returns a prop, or `Value::Null` if it is not set.
    #[must_use]
    pub fn prop(&self, key: &str) -> &Value {
        self.props.get(key).unwrap_or(&NULL)
    }

    /// Returns a prop as a string slice, if it is a string.
    #[must_use]
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.prop(key).as_str()
    }

    /// Sets a prop. The `theme` key replaces the theme instead.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if key == THEME_KEY {
            self.theme = value;
        } else {
            self.props.insert(key, value);
        }
    }
}
