// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CSS syntax normalization.
//!
//! Flattened rule sets are written the way authors write them: declarations
//! for the component itself, nested blocks with `&` self references, at-rules
//! wrapped around declarations. A [`CssTransformer`] turns that text into
//! plain, scoped CSS. [`NestingTransformer`] is the dependency-free
//! implementation and the default without the `std` feature.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::Chars;

use crate::hash::truncate_hash;

/// Where transformed rules are placed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SelectorContext<'a> {
    /// The selector (or at-rule name) owning the rules, e.g. `.hjKlm`.
    pub selector: &'a str,
    /// Text placed before the selector.
    ///
    /// An at-rule keyword such as `@keyframes` makes the output a single
    /// unscoped at-rule named by `selector`.
    pub prefix: Option<&'a str>,
    /// The stable id of the owning component, if any.
    ///
    /// Repeated `&` references in one nested selector after the first match
    /// every variant of the component through this id.
    pub component_id: &'a str,
}

/// A pure CSS text transformation.
///
/// Implementations must be deterministic. [`configuration_hash`] must change
/// exactly when the output for some input would change.
///
/// [`configuration_hash`]: CssTransformer::configuration_hash
pub trait CssTransformer: fmt::Debug + Send + Sync {
    /// Transforms `css` into scoped CSS for `cx`.
    fn transform(&self, css: &str, cx: &SelectorContext<'_>) -> String;

    /// Returns a hash of the settings that affect [`transform`](Self::transform).
    fn configuration_hash(&self) -> u64;
}

/// Properties that get vendor-prefixed copies when prefixing is on.
const PREFIXED: &[(&str, &[&str])] = &[
    ("appearance", &["-webkit-", "-moz-"]),
    ("backdrop-filter", &["-webkit-"]),
    ("hyphens", &["-webkit-", "-ms-"]),
    ("mask-image", &["-webkit-"]),
    ("text-size-adjust", &["-webkit-", "-moz-", "-ms-"]),
    ("user-select", &["-webkit-", "-moz-", "-ms-"]),
];

/// At-rules whose blocks hold rules for the enclosing selector.
const CONDITIONAL_AT_RULES: &[&str] = &["@container", "@document", "@layer", "@media", "@supports"];

/// A dependency-free transformer: nesting expansion and minification.
///
/// - `/* … */` comments and `//` line comments are removed.
/// - Declarations are grouped under the owning selector, before any nested
///   rules.
/// - Nested selectors replace `&` with the parent selector, or are joined to
///   it as descendants when they have no `&`. Selector lists multiply out.
/// - `@media`, `@supports`, `@container`, `@layer` and `@document` wrap the
///   scoped rules they contain. Other block at-rules (`@keyframes`,
///   `@font-face`, `@page`, …) are emitted unscoped, and block-less
///   statements (`@import`) pass through.
/// - Whitespace is collapsed outside strings.
///
/// # Example
///
/// ```rust
/// use understory_styled::{CssTransformer, NestingTransformer, SelectorContext};
///
/// let transformer = NestingTransformer::default();
/// let cx = SelectorContext {
///     selector: ".abc",
///     prefix: None,
///     component_id: "Button-x1",
/// };
/// let css = transformer.transform(
///     "color: red;\n&:hover { color: blue; }\n@media (min-width: 10px) { margin: 0 auto; }",
///     &cx,
/// );
/// assert_eq!(
///     css,
///     ".abc{color:red;}.abc:hover{color:blue;}@media (min-width: 10px){.abc{margin:0 auto;}}"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NestingTransformer {
    namespace: Option<String>,
    vendor_prefixes: bool,
}

impl NestingTransformer {
    /// Returns the namespace selector, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns whether vendor-prefixed copies are emitted.
    #[must_use]
    pub fn vendor_prefixes(&self) -> bool {
        self.vendor_prefixes
    }

    fn push_declaration(&self, declaration: &str, out: &mut String) {
        if self.vendor_prefixes {
            let property = declaration.split(':').next().unwrap_or_default();
            if let Some((_, prefixes)) = PREFIXED.iter().find(|(name, _)| *name == property) {
                for prefix in *prefixes {
                    out.push_str(prefix);
                    out.push_str(declaration);
                    out.push(';');
                }
            }
        }
        out.push_str(declaration);
        out.push(';');
    }

    fn emit_scoped(&self, nodes: &[Node], selectors: &[String], sibling: Option<&str>, out: &mut String) {
        let mut declarations = String::new();
        for node in nodes {
            if let Node::Declaration(declaration) = node {
                self.push_declaration(declaration, &mut declarations);
            }
        }
        if !declarations.is_empty() {
            out.push_str(&selectors.join(","));
            out.push('{');
            out.push_str(&declarations);
            out.push('}');
        }

        for node in nodes {
            match node {
                Node::Declaration(_) => {}
                Node::Statement(statement) => {
                    out.push_str(statement);
                    out.push(';');
                }
                Node::Block { prelude, children } if is_conditional(prelude) => {
                    let mut inner = String::new();
                    self.emit_scoped(children, selectors, sibling, &mut inner);
                    if !inner.is_empty() {
                        push_block(out, prelude, &inner);
                    }
                }
                Node::Block { prelude, children } if prelude.starts_with('@') => {
                    let mut inner = String::new();
                    self.emit_raw(children, &mut inner);
                    push_block(out, prelude, &inner);
                }
                Node::Block { prelude, children } => {
                    let nested = combine(selectors, prelude, sibling);
                    self.emit_scoped(children, &nested, None, out);
                }
            }
        }
    }

    fn emit_raw(&self, nodes: &[Node], out: &mut String) {
        for node in nodes {
            match node {
                Node::Declaration(declaration) => self.push_declaration(declaration, out),
                Node::Statement(statement) => {
                    out.push_str(statement);
                    out.push(';');
                }
                Node::Block { prelude, children } => {
                    let prelude = if prelude.starts_with('@') {
                        Cow::Borrowed(prelude.as_str())
                    } else {
                        Cow::Owned(minify_selector(prelude))
                    };
                    out.push_str(&prelude);
                    out.push('{');
                    self.emit_raw(children, out);
                    out.push('}');
                }
            }
        }
    }
}

impl CssTransformer for NestingTransformer {
    fn transform(&self, css: &str, cx: &SelectorContext<'_>) -> String {
        let css = strip_comments(css);
        let nodes = parse(&css);
        let mut out = String::new();

        if let Some(at_rule) = cx.prefix.filter(|prefix| prefix.starts_with('@')) {
            let mut body = String::new();
            self.emit_raw(&nodes, &mut body);
            if !body.is_empty() {
                out.push_str(at_rule);
                out.push(' ');
                push_block(&mut out, cx.selector, &body);
            }
            return out;
        }

        let root = root_selector(self.namespace.as_deref(), cx);
        let sibling = (!cx.component_id.is_empty()).then(|| format!(".{}", cx.component_id));
        self.emit_scoped(&nodes, &[root], sibling.as_deref(), &mut out);
        out
    }

    fn configuration_hash(&self) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"understory_styled::NestingTransformer/1");
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
        hasher.update(&[u8::from(self.vendor_prefixes)]);
        truncate_hash(&hasher.finalize())
    }
}

/// Builder for [`NestingTransformer`].
#[derive(Clone, Debug, Default)]
pub struct NestingTransformerBuilder {
    inner: NestingTransformer,
}

impl NestingTransformerBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `namespace` to every scoped selector.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.inner.namespace = (!namespace.trim().is_empty()).then_some(namespace);
        self
    }

    /// Emits vendor-prefixed copies of a small set of properties.
    #[must_use]
    pub fn vendor_prefixes(mut self, enabled: bool) -> Self {
        self.inner.vendor_prefixes = enabled;
        self
    }

    /// Builds the transformer.
    #[must_use]
    pub fn build(self) -> NestingTransformer {
        self.inner
    }
}

#[derive(Debug)]
enum Node {
    Declaration(String),
    Statement(String),
    Block { prelude: String, children: Vec<Node> },
}

fn push_block(out: &mut String, prelude: &str, body: &str) {
    out.push_str(prelude);
    out.push('{');
    out.push_str(body);
    out.push('}');
}

fn is_conditional(prelude: &str) -> bool {
    CONDITIONAL_AT_RULES.iter().any(|at_rule| {
        prelude
            .strip_prefix(at_rule)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '(']))
    })
}

/// Joins the namespace, a non at-rule prefix and the selector with spaces.
pub(crate) fn root_selector(namespace: Option<&str>, cx: &SelectorContext<'_>) -> String {
    let mut root = String::new();
    for part in [namespace, cx.prefix, Some(cx.selector)]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
    {
        if !root.is_empty() {
            root.push(' ');
        }
        root.push_str(part);
    }
    root
}

/// Rewrites every `&` after the first in a top-level nested selector to
/// `sibling`.
///
/// Only selectors directly inside the root rule (possibly through
/// conditional at-rules) are rewritten; deeper levels keep plain `&`.
pub(crate) fn mark_repeated_self_references<'a>(css: &'a str, sibling: &str) -> Cow<'a, str> {
    if css.matches('&').nth(1).is_none() {
        return Cow::Borrowed(css);
    }
    let mut out = String::with_capacity(css.len());
    // One entry per open block: `true` for at-rule blocks.
    let mut blocks: Vec<bool> = Vec::new();
    let mut segment = String::new();
    let mut quote = None;
    for c in css.chars() {
        if let Some(q) = quote {
            segment.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                segment.push(c);
            }
            '{' => {
                let at_rule = segment.trim_start().starts_with('@');
                if !at_rule && blocks.iter().all(|at| *at) {
                    out.push_str(&rewrite_prelude(&segment, sibling));
                } else {
                    out.push_str(&segment);
                }
                segment.clear();
                out.push(c);
                blocks.push(at_rule);
            }
            '}' | ';' => {
                out.push_str(&segment);
                segment.clear();
                out.push(c);
                if c == '}' {
                    blocks.pop();
                }
            }
            _ => segment.push(c),
        }
    }
    out.push_str(&segment);
    Cow::Owned(out)
}

fn rewrite_prelude(prelude: &str, sibling: &str) -> String {
    let mut out = String::with_capacity(prelude.len());
    let mut depth = 0_usize;
    let mut seen = 0_usize;
    for c in prelude.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => seen = 0,
            '&' => {
                seen += 1;
                if seen > 1 {
                    out.push_str(sibling);
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
    }
    out
}

pub(crate) fn strip_comments(css: &str) -> Cow<'_, str> {
    if !css.contains("/*") && !css.contains("//") {
        return Cow::Borrowed(css);
    }
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars();
    let mut quote = None;
    let mut line_blank = true;
    let mut pending = None;
    loop {
        let Some(c) = pending.take().or_else(|| chars.next()) else {
            break;
        };
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '/' {
            match chars.next() {
                Some('*') => {
                    let mut previous = '\0';
                    for next in chars.by_ref() {
                        if previous == '*' && next == '/' {
                            break;
                        }
                        previous = next;
                    }
                    continue;
                }
                Some('/') if line_blank => {
                    for next in chars.by_ref() {
                        if next == '\n' {
                            break;
                        }
                    }
                    out.push('\n');
                    continue;
                }
                next => pending = next,
            }
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        out.push(c);
        if c == '\n' {
            line_blank = true;
        } else if !c.is_whitespace() {
            line_blank = false;
        }
    }
    Cow::Owned(out)
}

fn parse(css: &str) -> Vec<Node> {
    parse_nodes(&mut css.chars())
}

fn parse_nodes(chars: &mut Chars<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut buffer = String::new();
    let mut quote = None;
    let mut depth = 0_usize;
    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            buffer.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    buffer.push(next);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                buffer.push(c);
            }
            '\\' => {
                buffer.push(c);
                if let Some(next) = chars.next() {
                    buffer.push(next);
                }
            }
            '(' | '[' => {
                depth += 1;
                buffer.push(c);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                buffer.push(c);
            }
            ';' if depth == 0 => flush(&mut buffer, &mut nodes),
            '{' if depth == 0 => {
                let prelude = collapse(&buffer);
                buffer.clear();
                let children = parse_nodes(chars);
                nodes.push(Node::Block { prelude, children });
            }
            '}' if depth == 0 => {
                flush(&mut buffer, &mut nodes);
                return nodes;
            }
            _ => buffer.push(c),
        }
    }
    flush(&mut buffer, &mut nodes);
    nodes
}

fn flush(buffer: &mut String, nodes: &mut Vec<Node>) {
    let text = buffer.trim();
    if text.starts_with('@') {
        nodes.push(Node::Statement(collapse(text)));
    } else if let Some((property, value)) = text.split_once(':') {
        let property = collapse(property);
        let value = collapse(value);
        if !property.is_empty() && !value.is_empty() {
            nodes.push(Node::Declaration(format!("{property}:{value}")));
        }
    }
    buffer.clear();
}

/// Trims and collapses whitespace runs to one space, outside strings.
fn collapse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote = None;
    let mut escaped = false;
    let mut space = false;
    for c in text.trim().chars() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_whitespace() {
            space = true;
            continue;
        }
        if space {
            out.push(' ');
            space = false;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        out.push(c);
    }
    out
}

/// Collapses whitespace and drops it around combinators and commas.
fn minify_selector(selector: &str) -> String {
    let collapsed = collapse(selector);
    let mut out = String::with_capacity(collapsed.len());
    let mut depth = 0_usize;
    let mut skip_space = false;
    for c in collapsed.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && matches!(c, '>' | '+' | '~' | ',') {
            if out.ends_with(' ') {
                out.pop();
            }
            out.push(c);
            skip_space = true;
            continue;
        }
        if skip_space && c == ' ' {
            continue;
        }
        skip_space = false;
        out.push(c);
    }
    out
}

/// Splits a selector list on top-level commas.
fn split_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quote = None;
    let mut start = 0;
    for (index, c) in list.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(list[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Resolves a nested selector list against its parents.
///
/// With `sibling` set, every `&` after the first in one selector becomes
/// `sibling` instead of the parent.
fn combine(parents: &[String], prelude: &str, sibling: Option<&str>) -> Vec<String> {
    let children = split_list(prelude);
    let mut out = Vec::with_capacity(parents.len() * children.len());
    for parent in parents {
        for child in &children {
            let child = minify_selector(child);
            if !child.contains('&') {
                out.push(format!("{parent} {child}"));
                continue;
            }
            let mut resolved = String::with_capacity(child.len() + parent.len());
            for (index, piece) in child.split('&').enumerate() {
                match (index, sibling) {
                    (0, _) => {}
                    (1, _) | (_, None) => resolved.push_str(parent),
                    (_, Some(sibling)) => resolved.push_str(sibling),
                }
                resolved.push_str(piece);
            }
            out.push(resolved);
        }
    }
    out
}
