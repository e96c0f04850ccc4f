// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The style registry: fingerprint table, injection and extraction.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, trace, warn};
use understory_sheet::{RehydrateSummary, StyleSheet, Tag, VirtualTag};

use crate::advisory::Advisory;
use crate::context::ExecutionContext;
use crate::error::StyleError;
use crate::flatten::flatten;
use crate::hash::{ClassName, Fingerprint};
use crate::identity::ComponentId;
use crate::interpolation::RuleSet;
use crate::stringify::Stringifier;

/// The default per-component variant count above which an advisory is raised.
pub const DEFAULT_WARN_THRESHOLD: u32 = 200;

/// Registry settings. See [`RegistryOptionsBuilder`].
#[derive(Clone, Debug)]
pub struct RegistryOptions {
    warn_threshold: Option<u32>,
    stringifier: Stringifier,
    static_optimization: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            warn_threshold: Some(DEFAULT_WARN_THRESHOLD),
            stringifier: Stringifier::default(),
            static_optimization: true,
        }
    }
}

impl RegistryOptions {
    /// Returns the variant threshold, if advisories are enabled.
    #[must_use]
    pub fn warn_threshold(&self) -> Option<u32> {
        self.warn_threshold
    }

    /// Returns the stringifier.
    #[must_use]
    pub fn stringifier(&self) -> &Stringifier {
        &self.stringifier
    }

    /// Returns whether static rule sets are resolved once and cached.
    #[must_use]
    pub fn static_optimization(&self) -> bool {
        self.static_optimization
    }
}

/// Builder for [`RegistryOptions`].
///
/// ```rust
/// use understory_styled::{RegistryOptionsBuilder, StyleRegistry};
///
/// let registry = StyleRegistry::with_options(
///     RegistryOptionsBuilder::new()
///         .warn_threshold(Some(50))
///         .static_optimization(false)
///         .build(),
/// );
/// assert_eq!(registry.options().warn_threshold(), Some(50));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RegistryOptionsBuilder {
    inner: RegistryOptions,
}

impl RegistryOptionsBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-component variant threshold; `None` disables the advisory.
    #[must_use]
    pub fn warn_threshold(mut self, threshold: Option<u32>) -> Self {
        self.inner.warn_threshold = threshold;
        self
    }

    /// Sets the stringifier.
    #[must_use]
    pub fn stringifier(mut self, stringifier: Stringifier) -> Self {
        self.inner.stringifier = stringifier;
        self
    }

    /// Enables or disables the static rule set cache.
    #[must_use]
    pub fn static_optimization(mut self, enabled: bool) -> Self {
        self.inner.static_optimization = enabled;
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> RegistryOptions {
        self.inner
    }
}

/// A read-only snapshot of a registry's output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedStyles {
    css: String,
    marked: String,
    component_ids: Vec<Arc<str>>,
}

impl SealedStyles {
    /// Returns the bare CSS, in group order then append order.
    #[must_use]
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Returns the CSS with group markers, suitable for rehydration.
    #[must_use]
    pub fn marked(&self) -> &str {
        &self.marked
    }

    /// Returns every component id that owned a group, in group order.
    #[must_use]
    pub fn component_ids(&self) -> &[Arc<str>] {
        &self.component_ids
    }

    /// Wraps the marked CSS in a `<style>` element.
    #[must_use]
    pub fn to_style_tag(&self) -> String {
        format!("<style data-styled=\"true\">{}</style>", self.marked)
    }
}

/// Resolves rule sets to class names and injects their CSS at most once.
///
/// One registry is one isolated scope: a document, or one server-rendered
/// request. Nothing is shared between registries. All mutation happens
/// through `&mut self`, so one resolve is always a single critical section.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use understory_styled::{
///     ExecutionContext, IdentityAllocator, Interpolation, RuleSet, StyleRegistry,
/// };
///
/// let mut ids = IdentityAllocator::new();
/// let button = ids.generate(Some("Button"), None);
/// let rules = RuleSet::new([
///     "color: ".into(),
///     Interpolation::function(|cx: &ExecutionContext| cx.theme()["primary"].clone()),
///     ";".into(),
/// ]);
///
/// let mut registry = StyleRegistry::new();
/// let red = ExecutionContext::new(json!({ "primary": "red" }));
/// let first = registry.resolve(&button, &rules, &red).unwrap().unwrap();
/// let again = registry.resolve(&button, &rules, &red).unwrap().unwrap();
/// assert_eq!(first, again);
/// assert!(registry.materialize().starts_with(&format!(".{first}{{color:red")));
/// ```
#[derive(Debug)]
pub struct StyleRegistry<T = VirtualTag> {
    sheet: StyleSheet<T>,
    fingerprints: HashMap<Fingerprint, ClassName>,
    static_names: HashMap<Arc<str>, ClassName>,
    variants: HashMap<Arc<str>, u32>,
    warned: HashSet<Arc<str>>,
    advisories: Vec<Advisory>,
    options: RegistryOptions,
    recorded_configuration: u64,
    mismatch_reported: bool,
    sealed: bool,
}

impl Default for StyleRegistry<VirtualTag> {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry<VirtualTag> {
    /// Creates an in-memory registry with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// Creates an in-memory registry.
    #[must_use]
    pub fn with_options(options: RegistryOptions) -> Self {
        Self::with_tag(VirtualTag::new(), options)
    }
}

impl<T: Tag> StyleRegistry<T> {
    /// Creates a registry writing through to `tag`, which should be empty.
    #[must_use]
    pub fn with_tag(tag: T, options: RegistryOptions) -> Self {
        let recorded_configuration = options.stringifier.configuration_hash();
        Self {
            sheet: StyleSheet::with_tag(tag),
            fingerprints: HashMap::new(),
            static_names: HashMap::new(),
            variants: HashMap::new(),
            warned: HashSet::new(),
            advisories: Vec::new(),
            options,
            recorded_configuration,
            mismatch_reported: false,
            sealed: false,
        }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Returns the active stringifier.
    #[must_use]
    pub fn stringifier(&self) -> &Stringifier {
        &self.options.stringifier
    }

    /// Returns the underlying sheet.
    #[must_use]
    pub fn sheet(&self) -> &StyleSheet<T> {
        &self.sheet
    }

    /// Returns the number of distinct fingerprints minted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    /// Returns `true` if nothing has been minted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Returns how many class variants `component` has injected.
    #[must_use]
    pub fn variant_count(&self, component: &ComponentId) -> u32 {
        self.variants.get(component.as_str()).copied().unwrap_or(0)
    }

    /// Returns `true` once [`seal`](Self::seal) has been called.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Resolves `rules` for `component` against `cx`.
    ///
    /// Returns the class name for the resolved style, or `None` if the rules
    /// produce no CSS. The first resolution of a style injects its CSS into
    /// the component's group; later ones return the same name without side
    /// effects.
    ///
    /// # Errors
    ///
    /// Returns the flattening error. Nothing is injected in that case.
    pub fn resolve(
        &mut self,
        component: &ComponentId,
        rules: &RuleSet,
        cx: &ExecutionContext,
    ) -> Result<Option<ClassName>, StyleError> {
        let id = component.shared();
        let is_static = self.options.static_optimization && rules.is_static();
        if is_static {
            if let Some(name) = self.static_names.get(id) {
                if self.sheet.has_name_for_id(id, name) {
                    return Ok(Some(name.clone()));
                }
            }
        }

        let flat = flatten(rules, cx)?;
        if flat.is_empty() {
            return Ok(None);
        }
        // The component's group is allocated before any keyframes it uses.
        self.sheet.register_id(id);
        for keyframes in flat.keyframes() {
            keyframes.inject(&mut self.sheet, &self.options.stringifier);
        }

        let css = flat.css();
        let fingerprint = Fingerprint::of(id, self.options.stringifier.configuration_hash(), &css);
        let name = self
            .fingerprints
            .entry(fingerprint)
            .or_insert_with(|| fingerprint.class_name())
            .clone();

        if !self.sheet.has_name_for_id(id, &name) {
            self.inject(id, &name, &css);
        }
        if is_static {
            self.static_names.insert(id.clone(), name.clone());
        }
        Ok(Some(name))
    }

    fn inject(&mut self, id: &Arc<str>, name: &ClassName, css: &str) {
        let rule = self
            .options
            .stringifier
            .stringify(css, &format!(".{name}"), None, id);
        if rule.is_empty() {
            self.sheet.register_name(id, name);
        } else {
            self.sheet.insert_rules(id, name, [rule]);
        }
        if self.sealed {
            debug!(component_id = %id, class_name = %name, "injected after seal");
        } else {
            trace!(component_id = %id, class_name = %name, "injected style");
        }

        let count = self.variants.entry(id.clone()).or_insert(0);
        *count += 1;
        let count = *count;
        let Some(threshold) = self.options.warn_threshold else {
            return;
        };
        if count > threshold && self.warned.insert(id.clone()) {
            let advisory = Advisory::TooManyClasses {
                component_id: id.clone(),
                threshold,
            };
            warn!(component_id = %id, threshold, "{advisory}");
            self.advisories.push(advisory);
        }
    }

    /// Replaces the stringifier.
    ///
    /// If its configuration differs from the recorded one, a
    /// [`Advisory::ConfigurationMismatch`] is raised once; resolution
    /// proceeds either way.
    pub fn set_stringifier(&mut self, stringifier: Stringifier) {
        let active = stringifier.configuration_hash();
        if active != self.recorded_configuration && !self.mismatch_reported {
            let advisory = Advisory::ConfigurationMismatch {
                recorded: self.recorded_configuration,
                active,
            };
            warn!("{advisory}");
            self.advisories.push(advisory);
            self.mismatch_reported = true;
        }
        self.options.stringifier = stringifier;
        self.static_names.clear();
    }

    /// Returns the advisories recorded so far.
    #[must_use]
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Drains the recorded advisories.
    ///
    /// Each advisory is still raised at most once; draining does not re-arm
    /// it.
    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        core::mem::take(&mut self.advisories)
    }

    /// Concatenates the injected CSS, in group order then append order.
    #[must_use]
    pub fn materialize(&self) -> String {
        self.sheet.materialize()
    }

    /// Renders the injected CSS with group markers for rehydration.
    #[must_use]
    pub fn marked_output(&self) -> String {
        self.sheet.marked_output()
    }

    /// Restores styles produced elsewhere by [`marked_output`](Self::marked_output).
    ///
    /// Styles already present are not injected again by later resolves.
    pub fn rehydrate(&mut self, marked: &str) -> RehydrateSummary {
        self.sheet.rehydrate(marked)
    }

    /// Takes a snapshot of the output and marks the registry as sealed.
    ///
    /// The registry stays usable; later injections are not part of the
    /// returned snapshot.
    pub fn seal(&mut self) -> SealedStyles {
        self.sealed = true;
        let sealed = SealedStyles {
            css: self.sheet.materialize(),
            marked: self.sheet.marked_output(),
            component_ids: self.sheet.touched_ids_shared(),
        };
        debug!(
            components = sealed.component_ids.len(),
            bytes = sealed.css.len(),
            "sealed registry"
        );
        sealed
    }

    /// Detaches `component`'s styles without disturbing any other group.
    pub fn remove_component(&mut self, component: &ComponentId) -> bool {
        self.sheet.remove_group(component.as_str())
    }

    /// Reattaches `component`'s styles at their original position.
    pub fn reinsert_component(&mut self, component: &ComponentId) -> bool {
        self.sheet.reinsert_group(component.as_str())
    }

    /// Drops `component`'s CSS and names so its styles are injected afresh.
    ///
    /// Its group keeps its position.
    pub fn clear_component(&mut self, component: &ComponentId) {
        let id = component.as_str();
        self.sheet.clear_rules(id);
        self.variants.remove(id);
        self.static_names.remove(id);
        self.warned.remove(id);
    }

    /// Discards every group, name, fingerprint and advisory.
    ///
    /// The current stringifier configuration becomes the recorded one.
    pub fn reset(&mut self) {
        self.sheet.clear();
        self.fingerprints.clear();
        self.static_names.clear();
        self.variants.clear();
        self.warned.clear();
        self.advisories.clear();
        self.recorded_configuration = self.options.stringifier.configuration_hash();
        self.mismatch_reported = false;
        self.sealed = false;
        debug!("registry reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityAllocator;
    use crate::interpolation::Interpolation;
    use crate::keyframes::Keyframes;
    use crate::transform::NestingTransformerBuilder;
    use serde_json::json;

    fn themed_color() -> RuleSet {
        RuleSet::new([
            "color: ".into(),
            Interpolation::function(|cx: &ExecutionContext| cx.prop("color").clone()),
            ";".into(),
        ])
    }

    fn color(value: &str) -> ExecutionContext {
        ExecutionContext::from_value(json!({ "color": value }))
    }

    fn nesting_registry() -> StyleRegistry {
        StyleRegistry::with_options(
            RegistryOptionsBuilder::new()
                .stringifier(Stringifier::nesting())
                .build(),
        )
    }

    #[test]
    fn empty_rules_resolve_to_none() {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(None, None);
        let mut registry = StyleRegistry::new();
        let rules = RuleSet::new([Interpolation::function(|_cx: &ExecutionContext| json!(null))]);
        assert_eq!(registry.resolve(&id, &rules, &ExecutionContext::default()), Ok(None));
        assert_eq!(registry.sheet().group_for_id(id.as_str()), None);
        assert!(registry.seal().component_ids().is_empty());
    }

    #[test]
    fn failed_resolves_allocate_nothing() {
        let mut ids = IdentityAllocator::new();
        let failing = ids.generate(Some("Failing"), None);
        let working = ids.generate(Some("Working"), None);
        let mut registry = StyleRegistry::new();
        let rules = RuleSet::new([Interpolation::function(|_cx: &ExecutionContext| json!(true))]);

        assert!(registry.resolve(&failing, &rules, &ExecutionContext::default()).is_err());
        assert_eq!(registry.sheet().group_for_id(failing.as_str()), None);

        registry.resolve(&working, &themed_color(), &color("red")).unwrap();
        assert_eq!(
            registry.seal().component_ids(),
            [working.shared().clone()]
        );
    }

    #[test]
    fn static_rules_are_cached_per_component() {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(Some("Plain"), None);
        let mut registry = StyleRegistry::new();
        let rules = RuleSet::new(["margin: 0;".into()]);

        let first = registry.resolve(&id, &rules, &color("x")).unwrap();
        assert!(registry.static_names.contains_key(id.as_str()));
        let second = registry.resolve(&id, &rules, &color("y")).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.variant_count(&id), 1);
    }

    #[test]
    fn cleared_components_are_injected_again() {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(Some("Plain"), None);
        let mut registry = nesting_registry();
        let rules = RuleSet::new(["margin: 0;".into()]);

        let name = registry.resolve(&id, &rules, &ExecutionContext::default()).unwrap().unwrap();
        registry.clear_component(&id);
        assert_eq!(registry.materialize(), "");
        let again = registry.resolve(&id, &rules, &ExecutionContext::default()).unwrap().unwrap();
        assert_eq!(name, again);
        assert_eq!(registry.materialize(), format!(".{name}{{margin:0;}}"));
    }

    #[test]
    fn threshold_none_disables_advisories() {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(None, None);
        let mut registry =
            StyleRegistry::with_options(RegistryOptionsBuilder::new().warn_threshold(None).build());
        for n in 0..5 {
            registry.resolve(&id, &themed_color(), &color(&format!("#{n:06x}"))).unwrap();
        }
        assert!(registry.advisories().is_empty());
        assert_eq!(registry.variant_count(&id), 5);
    }

    #[test]
    fn threshold_advisory_is_raised_once() {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(None, None);
        let mut registry =
            StyleRegistry::with_options(RegistryOptionsBuilder::new().warn_threshold(Some(2)).build());
        for n in 0..6 {
            registry.resolve(&id, &themed_color(), &color(&format!("#{n:06x}"))).unwrap();
        }
        assert_eq!(
            registry.take_advisories(),
            [Advisory::TooManyClasses {
                component_id: id.shared().clone(),
                threshold: 2,
            }]
        );
        assert!(registry.take_advisories().is_empty());
    }

    #[test]
    fn configuration_changes_are_reported_once_and_keep_names_distinct() {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(None, None);
        let mut registry = StyleRegistry::new();
        let before = registry.resolve(&id, &themed_color(), &color("red")).unwrap();

        let prefixed = Stringifier::new(NestingTransformerBuilder::new().vendor_prefixes(true).build());
        registry.set_stringifier(prefixed.clone());
        registry.set_stringifier(prefixed);
        let after = registry.resolve(&id, &themed_color(), &color("red")).unwrap();

        assert_ne!(before, after);
        assert!(matches!(
            registry.advisories(),
            [Advisory::ConfigurationMismatch { .. }]
        ));

        registry.reset();
        registry.set_stringifier(Stringifier::new(
            NestingTransformerBuilder::new().vendor_prefixes(true).build(),
        ));
        assert!(registry.advisories().is_empty());
    }

    #[test]
    fn keyframes_get_their_own_group_after_the_component() {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(Some("Spinner"), None);
        let spin = Keyframes::new(RuleSet::new(["to{transform:rotate(1turn);}".into()])).unwrap();
        let rules = RuleSet::new(["animation: ".into(), spin.clone().into(), " 1s linear;".into()]);

        let mut registry = nesting_registry();
        let name = registry.resolve(&id, &rules, &ExecutionContext::default()).unwrap().unwrap();
        registry.resolve(&id, &rules, &ExecutionContext::default()).unwrap();

        assert_eq!(
            registry.sheet().touched_ids().collect::<Vec<_>>(),
            [id.as_str(), spin.id()]
        );
        assert_eq!(
            registry.materialize(),
            format!(
                ".{name}{{animation:{} 1s linear;}}@keyframes {}{{to{{transform:rotate(1turn);}}}}",
                spin.name(),
                spin.name()
            )
        );
    }

    #[test]
    fn seal_snapshots_and_style_tag_wraps_marked_output() {
        let mut ids = IdentityAllocator::new();
        let id = ids.generate(Some("A"), None);
        let mut registry = StyleRegistry::new();
        registry.resolve(&id, &themed_color(), &color("red")).unwrap();

        let sealed = registry.seal();
        assert!(registry.is_sealed());
        registry.resolve(&id, &themed_color(), &color("teal")).unwrap();

        assert_eq!(sealed.component_ids(), [id.shared().clone()]);
        assert!(!sealed.css().contains("teal"));
        assert!(registry.materialize().contains("teal"));
        assert!(sealed.to_style_tag().starts_with("<style data-styled=\"true\">"));
        assert!(sealed.marked().contains("data-styled.g0"));
    }
}
