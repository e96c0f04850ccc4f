// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The construction front end: targets, options and styled components.
//!
//! [`Construct`] is an immutable configuration value. [`Construct::attrs`]
//! and [`Construct::with_config`] return derived copies, and
//! [`Construct::build`] turns the configuration plus a rule set into a
//! [`StyledComponent`].

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use serde_json::{Map, Value};
use understory_sheet::Tag;

use crate::component::ComponentStyle;
use crate::context::ExecutionContext;
use crate::error::StyleError;
use crate::identity::{IdentityAllocator, IdentityChain, fold_identities};
use crate::interpolation::{ComponentRef, Interpolation, RuleSet};
use crate::registry::StyleRegistry;

const CLASS_NAME: &str = "className";
const STYLE: &str = "style";

/// What a styled component renders: a host tag, or another styled component.
#[derive(Clone, Debug)]
pub enum StyledTarget {
    /// A host element name such as `div`.
    Tag(Cow<'static, str>),
    /// Another styled component, which is extended.
    Component(StyledComponent),
}

impl From<&'static str> for StyledTarget {
    fn from(tag: &'static str) -> Self {
        Self::Tag(Cow::Borrowed(tag))
    }
}

impl From<String> for StyledTarget {
    fn from(tag: String) -> Self {
        Self::Tag(Cow::Owned(tag))
    }
}

impl From<StyledComponent> for StyledTarget {
    fn from(component: StyledComponent) -> Self {
        Self::Component(component)
    }
}

/// A function computing attributes from the context.
pub type AttrsFn = Arc<dyn Fn(&ExecutionContext) -> Map<String, Value> + Send + Sync>;

/// Attributes merged into the context before styles resolve.
#[derive(Clone)]
pub enum Attrs {
    /// A fixed set of attributes.
    Static(Map<String, Value>),
    /// Attributes computed from the context so far.
    Dynamic(AttrsFn),
}

impl Attrs {
    /// Wraps a function of the context.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Map<String, Value> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    fn evaluate(&self, cx: &ExecutionContext) -> Map<String, Value> {
        match self {
            Self::Static(map) => map.clone(),
            Self::Dynamic(f) => f(cx),
        }
    }
}

impl From<Map<String, Value>> for Attrs {
    fn from(map: Map<String, Value>) -> Self {
        Self::Static(map)
    }
}

impl fmt::Debug for Attrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(map) => f.debug_tuple("Static").field(map).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Options handed from the front end to the core.
#[derive(Clone, Debug, Default)]
pub struct StyledOptions {
    attrs: Vec<Attrs>,
    component_id: Option<String>,
    display_name: Option<String>,
    parent_component_id: Option<String>,
}

impl StyledOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attrs step.
    #[must_use]
    pub fn attrs(mut self, attrs: impl Into<Attrs>) -> Self {
        self.attrs.push(attrs.into());
        self
    }

    /// Uses a caller-supplied component id instead of a generated one.
    #[must_use]
    pub fn component_id(mut self, id: impl Into<String>) -> Self {
        self.component_id = Some(id.into());
        self
    }

    /// Sets the display name, which also prefixes the component id.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Prefixes the generated component id with a parent id.
    #[must_use]
    pub fn parent_component_id(mut self, id: impl Into<String>) -> Self {
        self.parent_component_id = Some(id.into());
        self
    }

    /// Returns the attrs chain.
    #[must_use]
    pub fn attrs_chain(&self) -> &[Attrs] {
        &self.attrs
    }

    /// Returns the declared display name, if any.
    #[must_use]
    pub fn declared_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the declared component id, if any.
    #[must_use]
    pub fn declared_component_id(&self) -> Option<&str> {
        self.component_id.as_deref()
    }

    /// Merges `other` over `self`: set fields replace, attrs are appended.
    fn merged(&self, other: Self) -> Self {
        let mut merged = self.clone();
        merged.attrs.extend(other.attrs);
        merged.component_id = other.component_id.or(merged.component_id);
        merged.display_name = other.display_name.or(merged.display_name);
        merged.parent_component_id = other.parent_component_id.or(merged.parent_component_id);
        merged
    }
}

/// A styled component factory: a target plus options.
///
/// ```rust
/// use serde_json::json;
/// use understory_styled::{
///     ExecutionContext, IdentityAllocator, Interpolation, RuleSet, StyleRegistry,
///     StyledOptions, styled,
/// };
///
/// let mut ids = IdentityAllocator::new();
/// let button = styled("button")
///     .unwrap()
///     .with_config(StyledOptions::new().display_name("Button"))
///     .build(
///         &mut ids,
///         RuleSet::new([
///             "color: ".into(),
///             Interpolation::function(|cx: &ExecutionContext| cx.theme()["fg"].clone()),
///             ";".into(),
///         ]),
///     )
///     .unwrap();
///
/// let mut registry = StyleRegistry::new();
/// let cx = ExecutionContext::new(json!({ "fg": "black" }));
/// let class = button.class_name(&mut registry, &cx).unwrap();
///
/// // Stable component id first, then the generated name.
/// let mut parts = class.split(' ');
/// assert_eq!(parts.next(), Some(button.id().as_str()));
/// assert_eq!(parts.count(), 1);
/// assert_eq!(button.display_name(), "Button");
/// ```
#[derive(Clone, Debug)]
pub struct Construct {
    target: StyledTarget,
    options: StyledOptions,
}

impl Construct {
    /// Creates a factory for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidTarget`] if a tag name is empty or
    /// contains whitespace.
    pub fn new(target: impl Into<StyledTarget>) -> Result<Self, StyleError> {
        let target = target.into();
        if let StyledTarget::Tag(tag) = &target {
            if tag.is_empty() {
                return Err(StyleError::invalid_target(&**tag, "tag name is empty"));
            }
            if tag.chars().any(char::is_whitespace) {
                return Err(StyleError::invalid_target(
                    &**tag,
                    "tag name contains whitespace",
                ));
            }
        }
        Ok(Self {
            target,
            options: StyledOptions::default(),
        })
    }

    /// Returns the target.
    #[must_use]
    pub fn target(&self) -> &StyledTarget {
        &self.target
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &StyledOptions {
        &self.options
    }

    /// Returns a copy with `attrs` appended to the attrs chain.
    #[must_use]
    pub fn attrs(&self, attrs: impl Into<Attrs>) -> Self {
        self.with_config(StyledOptions::new().attrs(attrs))
    }

    /// Returns a copy with `config` merged over the current options.
    #[must_use]
    pub fn with_config(&self, config: StyledOptions) -> Self {
        Self {
            target: self.target.clone(),
            options: self.options.merged(config),
        }
    }

    /// Creates the component, drawing its identity from `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidTarget`] if a declared component id is
    /// empty.
    pub fn build(&self, ids: &mut IdentityAllocator, rules: RuleSet) -> Result<StyledComponent, StyleError> {
        let options = &self.options;
        let display_prefix = options.display_name.as_deref();
        let id = match options.component_id.as_deref() {
            Some(id) => ids.declare(id, display_prefix)?,
            None => ids.generate(display_prefix, options.parent_component_id.as_deref()),
        };

        let (tag, display_name, chain, base, attrs) = match &self.target {
            StyledTarget::Tag(tag) => (
                tag.clone(),
                format!("styled.{tag}"),
                IdentityChain::root(&id),
                None,
                options.attrs.clone(),
            ),
            StyledTarget::Component(parent) => {
                let inner = &*parent.inner;
                let mut attrs = inner.attrs.clone();
                attrs.extend(options.attrs.iter().cloned());
                (
                    inner.tag.clone(),
                    format!("Styled({})", inner.display_name),
                    fold_identities(&inner.chain, &id),
                    Some(inner.style.clone()),
                    attrs,
                )
            }
        };

        Ok(StyledComponent {
            inner: Arc::new(StyledComponentInner {
                tag,
                display_name: options.display_name.clone().unwrap_or(display_name),
                chain,
                style: ComponentStyle::new(id, rules, base),
                attrs,
            }),
        })
    }

    /// Creates the component with an identity from the process-wide
    /// allocator.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    #[cfg(feature = "std")]
    pub fn styles(&self, rules: RuleSet) -> Result<StyledComponent, StyleError> {
        crate::global::with_identities(|ids| self.build(ids, rules))
    }
}

/// Starts a styled component for a host tag.
///
/// # Errors
///
/// See [`Construct::new`].
pub fn styled(tag: impl Into<Cow<'static, str>>) -> Result<Construct, StyleError> {
    Construct::new(StyledTarget::Tag(tag.into()))
}

#[derive(Debug)]
struct StyledComponentInner {
    tag: Cow<'static, str>,
    display_name: String,
    chain: IdentityChain,
    style: ComponentStyle,
    attrs: Vec<Attrs>,
}

/// A built styled component. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct StyledComponent {
    inner: Arc<StyledComponentInner>,
}

/// The outcome of rendering a [`StyledComponent`] once.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    class_name: String,
    context: ExecutionContext,
}

impl Rendered {
    /// Returns the complete class list.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the context after attrs, which the styles resolved against.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Returns the class list and the context.
    #[must_use]
    pub fn into_parts(self) -> (String, ExecutionContext) {
        (self.class_name, self.context)
    }
}

impl StyledComponent {
    /// Returns the host tag rendered in the end.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.inner.display_name
    }

    /// Returns the component's own identity.
    #[must_use]
    pub fn id(&self) -> &crate::ComponentId {
        self.inner.style.id()
    }

    /// Returns the folded identity chain.
    #[must_use]
    pub fn identities(&self) -> &IdentityChain {
        &self.inner.chain
    }

    /// Returns the component style.
    #[must_use]
    pub fn style(&self) -> &ComponentStyle {
        &self.inner.style
    }

    /// Returns the attrs chain, inherited steps first.
    #[must_use]
    pub fn attrs(&self) -> &[Attrs] {
        &self.inner.attrs
    }

    /// An interpolation that flattens to this component's stable selector.
    #[must_use]
    pub fn selector(&self) -> Interpolation {
        Interpolation::Component(ComponentRef::new(self.id().shared().clone()))
    }

    /// Applies the attrs chain to `cx`.
    ///
    /// Each step sees the context merged with every earlier step. A
    /// `className` attribute is appended to the existing one and a `style`
    /// object is merged key by key; anything else replaces.
    #[must_use]
    pub fn apply_attrs(&self, cx: &ExecutionContext) -> ExecutionContext {
        let mut context = cx.clone();
        for attrs in &self.inner.attrs {
            for (key, value) in attrs.evaluate(&context) {
                if key == CLASS_NAME {
                    let joined = join_classes(context.prop_str(CLASS_NAME), value.as_str());
                    context.set(key, Value::String(joined));
                } else if key == STYLE {
                    let merged = match (context.prop(STYLE), value) {
                        (Value::Object(existing), Value::Object(update)) => {
                            let mut merged = existing.clone();
                            merged.extend(update);
                            Value::Object(merged)
                        }
                        (_, value) => value,
                    };
                    context.set(key, merged);
                } else {
                    context.set(key, value);
                }
            }
        }
        context
    }

    /// Applies attrs, resolves the styles and assembles the class list.
    ///
    /// The class list is the folded ids, the own id, the generated names
    /// (base styles first) and finally any `className` prop.
    ///
    /// # Errors
    ///
    /// Returns the resolution error.
    pub fn render<T: Tag>(
        &self,
        registry: &mut StyleRegistry<T>,
        cx: &ExecutionContext,
    ) -> Result<Rendered, StyleError> {
        let context = self.apply_attrs(cx);
        let generated = self.inner.style.generate_names(registry, &context)?;

        let mut class_name = String::new();
        let generated = generated.iter().map(|name| name.as_str());
        for part in self.inner.chain.iter().chain(generated).chain(context.prop_str(CLASS_NAME)) {
            if part.is_empty() {
                continue;
            }
            if !class_name.is_empty() {
                class_name.push(' ');
            }
            class_name.push_str(part);
        }
        Ok(Rendered {
            class_name,
            context,
        })
    }

    /// Like [`render`](Self::render), returning only the class list.
    ///
    /// # Errors
    ///
    /// Returns the resolution error.
    pub fn class_name<T: Tag>(
        &self,
        registry: &mut StyleRegistry<T>,
        cx: &ExecutionContext,
    ) -> Result<String, StyleError> {
        self.render(registry, cx).map(Rendered::into_parts).map(|(class_name, _)| class_name)
    }
}

fn join_classes(existing: Option<&str>, extra: Option<&str>) -> String {
    match (existing.filter(|s| !s.is_empty()), extra.filter(|s| !s.is_empty())) {
        (Some(existing), Some(extra)) => format!("{existing} {extra}"),
        (Some(only), None) | (None, Some(only)) => String::from(only),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn color_rules() -> RuleSet {
        RuleSet::new([
            "color: ".into(),
            Interpolation::function(|cx: &ExecutionContext| cx.prop("color").clone()),
            ";".into(),
        ])
    }

    #[test]
    fn empty_and_spaced_tags_are_rejected() {
        assert_eq!(
            styled("").unwrap_err(),
            StyleError::invalid_target("", "tag name is empty")
        );
        assert!(matches!(
            styled("my tag"),
            Err(StyleError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn declared_ids_must_not_be_empty() {
        let mut ids = IdentityAllocator::new();
        let construct = styled("div")
            .unwrap()
            .with_config(StyledOptions::new().component_id(""));
        assert!(construct.build(&mut ids, RuleSet::default()).is_err());
    }

    #[test]
    fn derived_copies_leave_the_original_untouched() {
        let base = styled("a").unwrap();
        let derived = base
            .attrs(map(json!({ "href": "#" })))
            .with_config(StyledOptions::new().display_name("Link"));
        assert!(base.options().attrs_chain().is_empty());
        assert_eq!(derived.options().attrs_chain().len(), 1);
        assert_eq!(derived.options().declared_display_name(), Some("Link"));
    }

    #[test]
    fn attrs_chain_sees_earlier_results_and_joins_class_names() {
        let mut ids = IdentityAllocator::new();
        let component = styled("input")
            .unwrap()
            .attrs(map(json!({ "color": "red", "className": "a" })))
            .attrs(Attrs::dynamic(|cx| {
                map(json!({
                    "color": format!("dark{}", cx.prop_str("color").unwrap_or_default()),
                    "className": "b",
                }))
            }))
            .build(&mut ids, color_rules())
            .unwrap();

        let mut registry = StyleRegistry::with_options(
            crate::RegistryOptionsBuilder::new()
                .stringifier(crate::Stringifier::nesting())
                .build(),
        );
        let rendered = component
            .render(&mut registry, &ExecutionContext::from_value(json!({ "className": "x" })))
            .unwrap();

        assert_eq!(rendered.context().prop("color"), &json!("darkred"));
        assert!(registry.materialize().contains("color:darkred;"));
        assert!(rendered.class_name().ends_with(" x a b"));
    }

    #[test]
    fn style_attrs_merge_key_by_key() {
        let mut ids = IdentityAllocator::new();
        let component = styled("div")
            .unwrap()
            .attrs(map(json!({ "style": { "top": 1, "left": 2 } })))
            .attrs(map(json!({ "style": { "left": 3 } })))
            .build(&mut ids, RuleSet::default())
            .unwrap();
        let context = component.apply_attrs(&ExecutionContext::default());
        assert_eq!(context.prop("style"), &json!({ "top": 1, "left": 3 }));
    }

    #[test]
    fn extending_folds_identities_and_inherits_attrs() {
        let mut ids = IdentityAllocator::new();
        let parent = styled("button")
            .unwrap()
            .attrs(map(json!({ "color": "blue" })))
            .with_config(StyledOptions::new().display_name("Button"))
            .build(&mut ids, color_rules())
            .unwrap();
        let child = Construct::new(parent.clone())
            .unwrap()
            .build(&mut ids, RuleSet::new(["font-weight: bold;".into()]))
            .unwrap();

        assert_eq!(child.tag(), "button");
        assert_eq!(child.display_name(), "Styled(Button)");
        assert_eq!(child.attrs().len(), 1);
        assert_eq!(
            child.identities().iter().collect::<Vec<_>>(),
            [parent.id().as_str(), child.id().as_str()]
        );

        let mut registry = StyleRegistry::with_options(
            crate::RegistryOptionsBuilder::new()
                .stringifier(crate::Stringifier::nesting())
                .build(),
        );
        let class = child.class_name(&mut registry, &ExecutionContext::default()).unwrap();
        let parts: Vec<&str> = class.split(' ').collect();
        assert_eq!(parts.len(), 4, "two ids and two generated names: {class}");
        assert_eq!(&parts[..2], [parent.id().as_str(), child.id().as_str()]);
        assert!(registry.materialize().contains("color:blue;"));
    }

    #[test]
    fn selector_interpolates_the_stable_id() {
        let mut ids = IdentityAllocator::new();
        let icon = styled("svg").unwrap().build(&mut ids, RuleSet::default()).unwrap();
        let flat = crate::flatten(
            &RuleSet::new([icon.selector(), " { fill: red; }".into()]),
            &ExecutionContext::default(),
        )
        .unwrap();
        assert_eq!(flat.css(), format!(".{} {{ fill: red; }}", icon.id()));
    }
}
