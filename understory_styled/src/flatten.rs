// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first flattening of rule sets into CSS text.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde_json::Value;
use smallvec::SmallVec;

use crate::context::ExecutionContext;
use crate::error::StyleError;
use crate::interpolation::{Interpolation, RuleSet, StyleObject, StyleValue};
use crate::keyframes::Keyframes;
use crate::object::{add_unit_if_needed, hyphenate};

/// The ordered output of [`flatten`].
#[derive(Clone, Debug, Default)]
pub struct Flattened {
    chunks: Vec<Cow<'static, str>>,
    keyframes: SmallVec<[Keyframes; 1]>,
}

impl Flattened {
    /// Returns the text chunks in output order.
    #[must_use]
    pub fn chunks(&self) -> &[Cow<'static, str>] {
        &self.chunks
    }

    /// Returns the keyframes referenced while flattening, in first-use order.
    ///
    /// They are not injected by flattening; the caller decides where.
    #[must_use]
    pub fn keyframes(&self) -> &[Keyframes] {
        &self.keyframes
    }

    /// Returns `true` if no text was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Concatenates the chunks.
    #[must_use]
    pub fn css(&self) -> String {
        self.chunks.concat()
    }

    fn push(&mut self, chunk: impl Into<Cow<'static, str>>) {
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    fn note_keyframes(&mut self, keyframes: &Keyframes) {
        if !self.keyframes.iter().any(|known| known.id() == keyframes.id()) {
            self.keyframes.push(keyframes.clone());
        }
    }
}

/// Flattens `rules` against `cx`.
///
/// Literals are appended as-is, functions are called with `cx` and their
/// results flattened in place, nested rule sets and JSON arrays are
/// flattened in order, and style objects are serialized as declarations and
/// nested blocks. `null`, `false` and empty strings are dropped; `0` is kept.
///
/// Flattening is a pure function of its inputs and holds no state between
/// calls.
///
/// # Errors
///
/// Returns [`StyleError::UnsupportedInterpolationKind`] for a bare `true` or
/// for a style object that cannot be serialized.
pub fn flatten(rules: &RuleSet, cx: &ExecutionContext) -> Result<Flattened, StyleError> {
    let mut out = Flattened::default();
    for item in rules.iter() {
        flatten_item(item, cx, &mut out)?;
    }
    Ok(out)
}

/// Returns `true` if `rules` flattens the same way in every context.
#[must_use]
pub fn is_static(rules: &RuleSet) -> bool {
    rules.is_static()
}

fn flatten_item(
    item: &Interpolation,
    cx: &ExecutionContext,
    out: &mut Flattened,
) -> Result<(), StyleError> {
    match item {
        Interpolation::Empty => {}
        Interpolation::Literal(text) => out.push(text.clone()),
        Interpolation::Value(value) => flatten_value(value, cx, out)?,
        Interpolation::Object(object) => flatten_object(object, cx, out)?,
        Interpolation::Function(f) => flatten_item(&f(cx), cx, out)?,
        Interpolation::Nested(rules) => {
            for item in rules.iter() {
                flatten_item(item, cx, out)?;
            }
        }
        Interpolation::Keyframes(keyframes) => {
            out.note_keyframes(keyframes);
            out.push(keyframes.name().to_string());
        }
        Interpolation::Component(component) => out.push(format!(".{}", component.id())),
    }
    Ok(())
}

fn flatten_value(value: &Value, cx: &ExecutionContext, out: &mut Flattened) -> Result<(), StyleError> {
    match value {
        Value::Null | Value::Bool(false) => {}
        Value::Bool(true) => return Err(StyleError::unsupported("boolean `true`")),
        Value::Number(number) => out.push(number.to_string()),
        Value::String(text) => out.push(text.clone()),
        Value::Array(items) => {
            for item in items {
                flatten_value(item, cx, out)?;
            }
        }
        Value::Object(_) => flatten_object(&StyleObject::from_json(value)?, cx, out)?,
    }
    Ok(())
}

fn flatten_object(
    object: &StyleObject,
    cx: &ExecutionContext,
    out: &mut Flattened,
) -> Result<(), StyleError> {
    for (key, value) in object.iter() {
        match value {
            StyleValue::Empty => {}
            StyleValue::Number(number) => {
                out.push(format!("{}: {};", hyphenate(key), add_unit_if_needed(key, *number)));
            }
            StyleValue::Text(text) => {
                if !text.is_empty() {
                    out.push(format!("{}: {text};", hyphenate(key)));
                }
            }
            StyleValue::Object(nested) => {
                out.push(format!("{key} {{"));
                flatten_object(nested, cx, out)?;
                out.push("}");
            }
            StyleValue::Dynamic(f) => {
                if let Some(text) = dynamic_value(key, &f(cx), cx, out)? {
                    out.push(format!("{}: {text};", hyphenate(key)));
                }
            }
        }
    }
    Ok(())
}

/// Evaluates a computed property value to its text, or `None` to drop it.
fn dynamic_value(
    key: &str,
    value: &Interpolation,
    cx: &ExecutionContext,
    out: &mut Flattened,
) -> Result<Option<String>, StyleError> {
    if let Interpolation::Value(Value::Number(number)) = value {
        return Ok(number.as_f64().map(|number| add_unit_if_needed(key, number)));
    }
    let mut inner = Flattened::default();
    flatten_item(value, cx, &mut inner)?;
    for keyframes in &inner.keyframes {
        out.note_keyframes(keyframes);
    }
    let text = inner.css();
    Ok((!text.is_empty()).then_some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::ComponentRef;
    use serde_json::json;

    fn css(rules: &RuleSet, cx: &ExecutionContext) -> String {
        flatten(rules, cx).unwrap().css()
    }

    #[test]
    fn functions_read_the_theme() {
        let rules = RuleSet::new([
            "color: ".into(),
            Interpolation::function(|cx: &ExecutionContext| cx.theme()["primary"].clone()),
            ";".into(),
        ]);
        let cx = ExecutionContext::new(json!({ "primary": "red" }));
        assert_eq!(css(&rules, &cx), "color: red;");
    }

    #[test]
    fn falsish_values_are_dropped_but_zero_is_kept() {
        let rules = RuleSet::new([
            json!(null).into(),
            json!(false).into(),
            json!("").into(),
            "".into(),
            Interpolation::Empty,
            json!(0).into(),
        ]);
        let flat = flatten(&rules, &ExecutionContext::default()).unwrap();
        assert_eq!(flat.chunks(), &[Cow::Borrowed("0")]);
    }

    #[test]
    fn bare_true_is_rejected() {
        let rules = RuleSet::new([Interpolation::function(|_cx: &ExecutionContext| true)]);
        assert_eq!(
            flatten(&rules, &ExecutionContext::default()).unwrap_err(),
            StyleError::unsupported("boolean `true`")
        );
    }

    #[test]
    fn functions_may_return_functions_and_arrays() {
        let rules = RuleSet::new([Interpolation::function(|_cx: &ExecutionContext| {
            Interpolation::function(|cx: &ExecutionContext| {
                json!(["a", null, cx.prop("n").clone(), ["b", false]])
            })
        })]);
        let cx = ExecutionContext::from_value(json!({ "n": 2 }));
        assert_eq!(css(&rules, &cx), "a2b");
    }

    #[test]
    fn nested_rule_sets_keep_order() {
        let inner = RuleSet::new(["b".into(), "c".into()]);
        let rules = RuleSet::new(["a".into(), inner.into(), "d".into()]);
        assert_eq!(css(&rules, &ExecutionContext::default()), "abcd");
    }

    #[test]
    fn objects_serialize_declarations_and_blocks() {
        let object = StyleObject::new()
            .set("backgroundColor", "blue")
            .set("margin", 0)
            .set("padding", 4)
            .set("zIndex", 3)
            .set("hidden", None::<&'static str>)
            .set("--gap", 2)
            .set(
                "@media (min-width: 10px)",
                StyleObject::new().set("&:hover", StyleObject::new().set("color", "red")),
            )
            .set_fn("width", |cx| cx.prop("w").clone())
            .set_fn("height", |_cx| json!(null));

        let cx = ExecutionContext::from_value(json!({ "w": 5 }));
        assert_eq!(
            css(&RuleSet::new([object.into()]), &cx),
            "background-color: blue;margin: 0;padding: 4px;z-index: 3;--gap: 2;\
             @media (min-width: 10px) {&:hover {color: red;}}width: 5px;"
        );
    }

    #[cfg(feature = "std")]
    #[test]
    fn json_objects_are_read_as_style_objects() {
        let rules = RuleSet::new([Interpolation::function(|_cx: &ExecutionContext| {
            json!({ "fontSize": 10, "color": "red" })
        })]);
        assert_eq!(
            css(&rules, &ExecutionContext::default()),
            "font-size: 10px;color: red;"
        );

        let bad = RuleSet::new([json!({ "margin": [1, 2] }).into()]);
        assert!(flatten(&bad, &ExecutionContext::default()).is_err());
    }

    #[cfg(feature = "std")]
    #[test]
    fn json_objects_keep_declaration_order_for_the_cascade() {
        let rules = RuleSet::new([Interpolation::function(|_cx: &ExecutionContext| {
            json!({ "paddingTop": 4, "padding": 0 })
        })]);
        assert_eq!(
            css(&rules, &ExecutionContext::default()),
            "padding-top: 4px;padding: 0;"
        );

        let nested = RuleSet::new([json!({
            "zIndex": 1,
            "&:hover": { "marginLeft": 2, "margin": 0 },
            "animationDelay": "1s",
        })
        .into()]);
        assert_eq!(
            css(&nested, &ExecutionContext::default()),
            "z-index: 1;&:hover {margin-left: 2px;margin: 0;}animation-delay: 1s;"
        );
    }

    #[test]
    fn components_flatten_to_their_selector() {
        let rules = RuleSet::new([
            ComponentRef::new("Button-abc").into(),
            ":hover & { color: red; }".into(),
        ]);
        assert_eq!(
            css(&rules, &ExecutionContext::default()),
            ".Button-abc:hover & { color: red; }"
        );
    }

    #[test]
    fn keyframes_are_collected_once() {
        let fade = Keyframes::new(RuleSet::new(["from{opacity:0;}to{opacity:1;}".into()])).unwrap();
        let rules = RuleSet::new([
            "animation: ".into(),
            fade.clone().into(),
            " 1s;".into(),
            fade.clone().into(),
        ]);
        let flat = flatten(&rules, &ExecutionContext::default()).unwrap();
        assert_eq!(flat.keyframes().len(), 1);
        assert_eq!(flat.css(), format!("animation: {} 1s;{}", fade.name(), fade.name()));
    }

    #[test]
    fn flattening_is_repeatable() {
        let rules = RuleSet::new([
            "a:".into(),
            Interpolation::function(|cx: &ExecutionContext| cx.prop("v").clone()),
        ]);
        let cx = ExecutionContext::from_value(json!({ "v": "x" }));
        assert_eq!(css(&rules, &cx), css(&rules, &cx));
        assert!(!is_static(&rules));
    }
}
