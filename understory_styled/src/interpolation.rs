// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule sets and the interpolations they are made of.
//!
//! A [`RuleSet`] is an ordered, immutable sequence of [`Interpolation`]s:
//! static text interleaved with functions of the [`ExecutionContext`], style
//! objects, nested rule sets, keyframes and references to other components.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::StyleError;
use crate::keyframes::Keyframes;

/// A function of the execution context producing another interpolation.
pub type StyleFn = Arc<dyn Fn(&ExecutionContext) -> Interpolation + Send + Sync>;

/// One element of a [`RuleSet`].
#[derive(Clone)]
pub enum Interpolation {
    /// Nothing. Flattens to no output.
    Empty,
    /// Static CSS text.
    Literal(Cow<'static, str>),
    /// A dynamic JSON value (usually returned by a function).
    ///
    /// Strings and numbers become text, arrays flatten element-wise, objects
    /// are read as style objects, `null` and `false` are dropped.
    Value(Value),
    /// A style object literal.
    Object(StyleObject),
    /// A function evaluated against the execution context.
    Function(StyleFn),
    /// A nested rule set.
    Nested(RuleSet),
    /// An animation identity; flattens to its name.
    Keyframes(Keyframes),
    /// A reference to another component; flattens to its class selector.
    Component(ComponentRef),
}

impl Interpolation {
    /// Wraps a function of the execution context.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use understory_styled::{ExecutionContext, Interpolation, RuleSet, flatten};
    ///
    /// let rules = RuleSet::new([
    ///     Interpolation::from("color: "),
    ///     Interpolation::function(|cx: &ExecutionContext| cx.theme()["primary"].clone()),
    ///     Interpolation::from(";"),
    /// ]);
    /// let cx = ExecutionContext::new(json!({ "primary": "red" }));
    /// assert_eq!(flatten(&rules, &cx).unwrap().css(), "color: red;");
    /// ```
    pub fn function<F, I>(f: F) -> Self
    where
        F: Fn(&ExecutionContext) -> I + Send + Sync + 'static,
        I: Into<Self>,
    {
        Self::Function(Arc::new(move |cx| f(cx).into()))
    }

    /// Returns `true` if flattening this element never consults the context.
    #[must_use]
    pub fn is_static(&self) -> bool {
        match self {
            Self::Function(_) => false,
            Self::Nested(rules) => rules.is_static(),
            Self::Object(object) => object.is_static(),
            Self::Empty
            | Self::Literal(_)
            | Self::Value(_)
            | Self::Keyframes(_)
            | Self::Component(_) => true,
        }
    }
}

impl fmt::Debug for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Object(object) => f.debug_tuple("Object").field(object).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Nested(rules) => f.debug_tuple("Nested").field(rules).finish(),
            Self::Keyframes(keyframes) => f.debug_tuple("Keyframes").field(keyframes).finish(),
            Self::Component(component) => f.debug_tuple("Component").field(component).finish(),
        }
    }
}

impl From<&'static str> for Interpolation {
    fn from(text: &'static str) -> Self {
        Self::Literal(Cow::Borrowed(text))
    }
}

impl From<String> for Interpolation {
    fn from(text: String) -> Self {
        Self::Literal(Cow::Owned(text))
    }
}

impl From<Cow<'static, str>> for Interpolation {
    fn from(text: Cow<'static, str>) -> Self {
        Self::Literal(text)
    }
}

impl From<Value> for Interpolation {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<f64> for Interpolation {
    fn from(number: f64) -> Self {
        serde_json::Number::from_f64(number).map_or(Self::Empty, |n| Self::Value(Value::Number(n)))
    }
}

impl From<i64> for Interpolation {
    fn from(number: i64) -> Self {
        Self::Value(Value::from(number))
    }
}

impl From<bool> for Interpolation {
    fn from(flag: bool) -> Self {
        Self::Value(Value::Bool(flag))
    }
}

impl From<StyleObject> for Interpolation {
    fn from(object: StyleObject) -> Self {
        Self::Object(object)
    }
}

impl From<RuleSet> for Interpolation {
    fn from(rules: RuleSet) -> Self {
        Self::Nested(rules)
    }
}

impl From<Vec<Self>> for Interpolation {
    fn from(items: Vec<Self>) -> Self {
        Self::Nested(RuleSet::new(items))
    }
}

impl From<Keyframes> for Interpolation {
    fn from(keyframes: Keyframes) -> Self {
        Self::Keyframes(keyframes)
    }
}

impl From<ComponentRef> for Interpolation {
    fn from(component: ComponentRef) -> Self {
        Self::Component(component)
    }
}

impl<T: Into<Self>> From<Option<T>> for Interpolation {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// A reference to another component's stable class selector.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    id: Arc<str>,
}

impl ComponentRef {
    /// Creates a reference to the component with the given id.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self { id: id.into() }
    }

    /// Returns the referenced component id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// An ordered, immutable sequence of interpolations.
///
/// Cloning is cheap (`Arc`).
#[derive(Clone, Default)]
pub struct RuleSet {
    items: Arc<[Interpolation]>,
}

impl RuleSet {
    /// Creates a rule set from interpolations.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = Interpolation>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Interleaves template chunks with interpolations.
    ///
    /// `strings` holds the static chunks around each interpolation, so it is
    /// expected to be one longer than `interpolations`; surplus entries on
    /// either side are appended in order. Empty chunks are dropped.
    ///
    /// ```rust
    /// use understory_styled::{ExecutionContext, Interpolation, RuleSet, flatten};
    ///
    /// let rules = RuleSet::from_template(
    ///     &["margin: ", "px ", "px;"],
    ///     [Interpolation::from(4_i64), Interpolation::from(8_i64)],
    /// );
    /// let flat = flatten(&rules, &ExecutionContext::default()).unwrap();
    /// assert_eq!(flat.css(), "margin: 4px 8px;");
    /// ```
    #[must_use]
    pub fn from_template(
        strings: &[&'static str],
        interpolations: impl IntoIterator<Item = Interpolation>,
    ) -> Self {
        let mut items = Vec::with_capacity(strings.len() * 2);
        let mut strings = strings.iter();
        let mut interpolations = interpolations.into_iter();
        loop {
            let chunk = strings.next();
            if let Some(chunk) = chunk.filter(|chunk| !chunk.is_empty()) {
                items.push(Interpolation::Literal(Cow::Borrowed(chunk)));
            }
            let interpolation = interpolations.next();
            let done = chunk.is_none() && interpolation.is_none();
            if let Some(interpolation) = interpolation {
                items.push(interpolation);
            }
            if done {
                break;
            }
        }
        Self::new(items)
    }

    /// Returns the number of top-level elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the rule set has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the top-level elements.
    pub fn iter(&self) -> impl Iterator<Item = &Interpolation> + '_ {
        self.items.iter()
    }

    /// Returns `true` if no element needs the execution context.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.items.iter().all(Interpolation::is_static)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl FromIterator<Interpolation> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Interpolation>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Builds a rule set from template chunks and the values between them.
///
/// Shorthand for [`RuleSet::from_template`].
#[must_use]
pub fn css(
    strings: &[&'static str],
    interpolations: impl IntoIterator<Item = Interpolation>,
) -> RuleSet {
    RuleSet::from_template(strings, interpolations)
}

/// A value inside a [`StyleObject`].
#[derive(Clone)]
pub enum StyleValue {
    /// Dropped on output.
    Empty,
    /// A number; non-zero numbers get `px` unless the property is unitless.
    Number(f64),
    /// Literal value text.
    Text(Cow<'static, str>),
    /// A nested selector block.
    Object(StyleObject),
    /// A value computed from the execution context.
    Dynamic(StyleFn),
}

impl fmt::Debug for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Number(number) => f.debug_tuple("Number").field(number).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Object(object) => f.debug_tuple("Object").field(object).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&'static str> for StyleValue {
    fn from(text: &'static str) -> Self {
        Self::Text(Cow::Borrowed(text))
    }
}

impl From<String> for StyleValue {
    fn from(text: String) -> Self {
        Self::Text(Cow::Owned(text))
    }
}

impl From<f64> for StyleValue {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<i32> for StyleValue {
    fn from(number: i32) -> Self {
        Self::Number(f64::from(number))
    }
}

impl From<u32> for StyleValue {
    fn from(number: u32) -> Self {
        Self::Number(f64::from(number))
    }
}

impl From<StyleObject> for StyleValue {
    fn from(object: StyleObject) -> Self {
        Self::Object(object)
    }
}

impl<T: Into<Self>> From<Option<T>> for StyleValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// An ordered mapping of CSS properties (or nested selectors) to values.
///
/// Keys may be camelCase (`backgroundColor`) or already hyphenated.
///
/// # Example
///
/// ```rust
/// use understory_styled::{ExecutionContext, RuleSet, StyleObject, flatten};
///
/// let object = StyleObject::new()
///     .set("fontSize", 12)
///     .set("lineHeight", 1.5)
///     .set("&:hover", StyleObject::new().set("opacity", 0));
///
/// let rules = RuleSet::new([object.into()]);
/// let flat = flatten(&rules, &ExecutionContext::default()).unwrap();
/// assert_eq!(
///     flat.css(),
///     "font-size: 12px;line-height: 1.5;&:hover {opacity: 0;}"
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct StyleObject {
    entries: Vec<(Cow<'static, str>, StyleValue)>,
}

impl StyleObject {
    /// Creates an empty style object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a property (or nested selector) and its value.
    #[must_use]
    pub fn set(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<StyleValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Appends a property whose value is computed from the execution context.
    #[must_use]
    pub fn set_fn<F, I>(self, key: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&ExecutionContext) -> I + Send + Sync + 'static,
        I: Into<Interpolation>,
    {
        self.set(key, StyleValue::Dynamic(Arc::new(move |cx| f(cx).into())))
    }

    /// Reads a JSON object as a style object in the map's iteration order.
    ///
    /// With the `std` feature `serde_json` keeps insertion order, so
    /// declarations come out as written and later ones win the cascade.
    /// Without it `serde_json::Map` is sorted by key; build a
    /// [`StyleObject`] with [`set`](Self::set) when order matters there.
    ///
    /// `null` and `false` values are dropped. Nested objects become nested
    /// blocks.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::UnsupportedInterpolationKind`] if `value` is not
    /// an object, or if any property value is `true` or an array.
    pub fn from_json(value: &Value) -> Result<Self, StyleError> {
        let Value::Object(map) = value else {
            return Err(StyleError::unsupported("non-object style object"));
        };
        let mut object = Self::new();
        for (key, value) in map {
            let value = match value {
                Value::Null | Value::Bool(false) => StyleValue::Empty,
                Value::Bool(true) => {
                    return Err(StyleError::unsupported("boolean `true` as a style value"));
                }
                Value::Number(number) => number
                    .as_f64()
                    .map_or(StyleValue::Empty, StyleValue::Number),
                Value::String(text) => StyleValue::Text(Cow::Owned(text.clone())),
                Value::Array(_) => {
                    return Err(StyleError::unsupported("array as a style value"));
                }
                Value::Object(_) => StyleValue::Object(Self::from_json(value)?),
            };
            object.entries.push((Cow::Owned(key.clone()), value));
        }
        Ok(object)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> + '_ {
        self.entries.iter().map(|(key, value)| (&**key, value))
    }

    /// Returns `true` if no value needs the execution context.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.entries.iter().all(|(_, value)| match value {
            StyleValue::Dynamic(_) => false,
            StyleValue::Object(object) => object.is_static(),
            StyleValue::Empty | StyleValue::Number(_) | StyleValue::Text(_) => true,
        })
    }
}
