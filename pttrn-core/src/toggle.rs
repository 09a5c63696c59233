//! The toggle engine.
//!
//! A click on a trigger flips the `active` class on the trigger, its target and
//! every co-trigger, flips `hidden` on the target, keeps the boolean ARIA
//! attributes in step, removes hidden content from the tab order and, for
//! anchor triggers, syncs the URL hash and focus. Targets are resolved from
//! `href` (a fragment) and then `aria-controls` (an id).

use crate::dom::{Dom, Event, EventKind, ListenerId, delegate_click};
use crate::registry::ToggleRegistry;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Default trigger selector.
pub const SELECTOR: &str = r#"[data-js*="toggle"]"#;
/// Default prefix for `data-*` settings on triggers.
pub const NAMESPACE: &str = "toggle";
pub const INACTIVE_CLASS: &str = "hidden";
pub const ACTIVE_CLASS: &str = "active";
/// Boolean ARIA attributes flipped on the trigger and co-triggers.
pub const EL_ARIA_ROLES: [&str; 2] = ["aria-pressed", "aria-expanded"];
/// Boolean ARIA attributes flipped on the target.
pub const TARGET_ARIA_ROLES: [&str; 1] = ["aria-hidden"];
/// Descendants of a target that take part in the tab order.
pub const FOCUSABLE: [&str; 21] = [
    "a",
    "button",
    "input",
    "select",
    "textarea",
    "object",
    "embed",
    "form",
    "fieldset",
    "legend",
    "label",
    "area",
    "audio",
    "video",
    "iframe",
    "svg",
    "details",
    "table",
    "[tabindex]",
    "[contenteditable]",
    "[usemap]",
];

/// Tri-state reading of a boolean ARIA attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AriaState {
    /// Missing or empty; never touched.
    Absent,
    True,
    /// Any present value other than `"true"`.
    False,
}

impl AriaState {
    #[must_use]
    pub fn read(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::Absent,
            Some("true") => Self::True,
            Some(_) => Self::False,
        }
    }

    /// The value written when the attribute is flipped.
    #[must_use]
    pub const fn flipped(self) -> Option<&'static str> {
        match self {
            Self::Absent => None,
            Self::True => Some("false"),
            Self::False => Some("true"),
        }
    }
}

/// Serializable toggle settings. Empty strings fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToggleSettings {
    pub selector: String,
    pub namespace: String,
    pub inactive_class: String,
    pub active_class: String,
}

impl Default for ToggleSettings {
    fn default() -> Self {
        Self {
            selector: SELECTOR.to_string(),
            namespace: NAMESPACE.to_string(),
            inactive_class: INACTIVE_CLASS.to_string(),
            active_class: ACTIVE_CLASS.to_string(),
        }
    }
}

impl ToggleSettings {
    #[must_use]
    pub fn with_selector(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn resolved(self) -> Self {
        fn or(value: String, fallback: &str) -> String {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value
            }
        }
        Self {
            selector: or(self.selector, SELECTOR),
            namespace: or(self.namespace, NAMESPACE),
            inactive_class: or(self.inactive_class, INACTIVE_CLASS),
            active_class: or(self.active_class, ACTIVE_CLASS),
        }
    }

    fn data_attr(&self, name: &str) -> String {
        format!("data-{}-{name}", self.namespace)
    }
}

/// Callback run before or after the state mutation.
pub type Hook<D> = Rc<dyn Fn(&Toggle<D>)>;

/// Construction options for [`Toggle::new`].
pub struct ToggleConfig<D: Dom> {
    pub settings: ToggleSettings,
    /// Bind to this element instead of delegating from `<body>`.
    pub element: Option<D::Node>,
    pub before: Option<Hook<D>>,
    pub after: Option<Hook<D>>,
}

impl<D: Dom> Default for ToggleConfig<D> {
    fn default() -> Self {
        Self {
            settings: ToggleSettings::default(),
            element: None,
            before: None,
            after: None,
        }
    }
}

impl<D: Dom> ToggleConfig<D> {
    #[must_use]
    pub fn with_selector(selector: &str) -> Self {
        Self {
            settings: ToggleSettings::with_selector(selector),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn after(mut self, hook: impl Fn(&Toggle<D>) + 'static) -> Self {
        self.after = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn before(mut self, hook: impl Fn(&Toggle<D>) + 'static) -> Self {
        self.before = Some(Rc::new(hook));
        self
    }
}

/// The nodes involved in the latest interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleState<N> {
    pub element: N,
    pub target: N,
    pub others: Vec<N>,
    pub focusable: Vec<N>,
}

struct ToggleInner<D: Dom> {
    dom: D,
    settings: ToggleSettings,
    element: Option<D::Node>,
    before: Option<Hook<D>>,
    after: Option<Hook<D>>,
    state: RefCell<Option<ToggleState<D::Node>>>,
}

/// A toggle instance. Clones share state.
pub struct Toggle<D: Dom> {
    inner: Rc<ToggleInner<D>>,
}

impl<D: Dom> Clone for Toggle<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom> fmt::Debug for Toggle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toggle")
            .field("settings", &self.inner.settings)
            .field("element", &self.inner.element)
            .field("state", &self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Toggle<D> {
    /// Builds a toggle and binds its click listener.
    ///
    /// With `config.element` the listener goes on that element. Otherwise one
    /// delegated listener is bound on `<body>`, unless `registry` already holds
    /// the selector, in which case the existing listener serves this instance.
    pub fn new(dom: &D, registry: &ToggleRegistry, config: ToggleConfig<D>) -> Self {
        let settings = config.settings.resolved();
        let toggle = Self {
            inner: Rc::new(ToggleInner {
                dom: dom.clone(),
                settings,
                element: config.element,
                before: config.before,
                after: config.after,
                state: RefCell::new(None),
            }),
        };
        let selector = toggle.inner.settings.selector.clone();

        if let Some(element) = &toggle.inner.element {
            let this = toggle.clone();
            dom.add_listener(
                element,
                EventKind::Click,
                Rc::new(move |event: &Event<D::Node>| this.toggle(event)),
            );
        } else if registry.claim(&selector) {
            let this = toggle.clone();
            if delegate_click(dom, &selector, move |event| this.toggle(event)).is_none() {
                log::warn!("toggle `{selector}`: document has no body");
            }
        } else {
            log::debug!("toggle `{selector}`: delegated listener already bound");
        }
        // Direct bindings are recorded too so a later delegated toggle for the
        // same selector does not double-toggle.
        registry.claim(&selector);
        toggle
    }

    #[must_use]
    pub fn settings(&self) -> &ToggleSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn dom(&self) -> &D {
        &self.inner.dom
    }

    /// The element bound at construction, if any.
    #[must_use]
    pub fn element(&self) -> Option<&D::Node> {
        self.inner.element.as_ref()
    }

    /// Nodes of the latest interaction.
    #[must_use]
    pub fn state(&self) -> Option<ToggleState<D::Node>> {
        self.inner.state.borrow().clone()
    }

    /// Whether `node` carries the active class.
    #[must_use]
    pub fn is_active(&self, node: &D::Node) -> bool {
        self.inner.dom.has_class(node, &self.inner.settings.active_class)
    }

    /// Resolves a trigger's target: the `href` fragment first, then
    /// `aria-controls`, which replaces the first result whenever present.
    #[must_use]
    pub fn resolve_target(&self, el: &D::Node) -> Option<D::Node> {
        let dom = &self.inner.dom;
        let mut target = dom.attribute(el, "href").and_then(|href| {
            let id = href.strip_prefix('#').unwrap_or(&href);
            if id.is_empty() {
                None
            } else {
                dom.element_by_id(id)
            }
        });
        if let Some(controls) = dom.attribute(el, "aria-controls") {
            target = dom.element_by_id(&controls);
        }
        target
    }

    #[must_use]
    pub fn focusable_in(&self, target: &D::Node) -> Vec<D::Node> {
        self.inner
            .dom
            .query_selector_all(Some(target), &FOCUSABLE.join(", "))
    }

    /// Click handler: resolves the target and toggles it. A trigger without a
    /// resolvable target is a no-op.
    pub fn toggle(&self, event: &Event<D::Node>) {
        let dom = &self.inner.dom;
        let el = event.target().clone();
        event.prevent_default();

        let Some(target) = self.resolve_target(&el) else {
            log::debug!("toggle: trigger {el:?} has no target");
            return;
        };
        let focusable = self.focusable_in(&target);
        self.element_toggle(&el, &target, &focusable);

        let undo_attr = self.inner.settings.data_attr("undo");
        let Some(undo_selector) = dom.attribute(&el, &undo_attr).filter(|s| !s.is_empty()) else {
            return;
        };
        let Some(undo) = dom.query_selector(None, &undo_selector) else {
            log::debug!("toggle: undo control `{undo_selector}` not found");
            return;
        };
        self.bind_undo(undo, el, target);
    }

    fn bind_undo(&self, undo: D::Node, el: D::Node, target: D::Node) {
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let this = self.clone();
        let own_id = Rc::clone(&slot);
        let undo_node = undo.clone();
        let id = self.inner.dom.add_listener(
            &undo,
            EventKind::Click,
            Rc::new(move |event: &Event<D::Node>| {
                event.prevent_default();
                this.element_toggle(&el, &target, &[]);
                if let Some(id) = own_id.take() {
                    this.inner.dom.remove_listener(&undo_node, id);
                }
            }),
        );
        slot.set(Some(id));
    }

    /// Flips the trigger, target and co-triggers.
    pub fn element_toggle(&self, el: &D::Node, target: &D::Node, focusable: &[D::Node]) {
        let dom = &self.inner.dom;
        let settings = &self.inner.settings;

        let others = dom
            .attribute(el, "aria-controls")
            .map(|controls| dom.query_selector_all(None, &format!(r#"[aria-controls="{controls}"]"#)))
            .unwrap_or_default();

        self.inner.state.replace(Some(ToggleState {
            element: el.clone(),
            target: target.clone(),
            others: others.clone(),
            focusable: focusable.to_vec(),
        }));

        if let Some(before) = &self.inner.before {
            before(self);
        }

        if !settings.active_class.is_empty() {
            dom.toggle_class(el, &settings.active_class);
            dom.toggle_class(target, &settings.active_class);
            for other in others.iter().filter(|o| *o != el) {
                dom.toggle_class(other, &settings.active_class);
            }
        }
        if !settings.inactive_class.is_empty() {
            dom.toggle_class(target, &settings.inactive_class);
        }

        for attr in TARGET_ARIA_ROLES {
            let state = AriaState::read(dom.attribute(target, attr).as_deref());
            if let Some(next) = state.flipped() {
                dom.set_attribute(target, attr, next);
            }
        }

        let default_tabindex = settings.data_attr("tabindex");
        for node in focusable {
            if dom.attribute(node, "tabindex").as_deref() == Some("-1") {
                match dom.attribute(node, &default_tabindex).filter(|v| !v.is_empty()) {
                    Some(default) => dom.set_attribute(node, "tabindex", &default),
                    None => dom.remove_attribute(node, "tabindex"),
                }
            } else {
                dom.set_attribute(node, "tabindex", "-1");
            }
        }

        if let Some(href) = dom.attribute(el, "href") {
            let location = dom.location();
            dom.replace_history(&format!("{}{}", location.pathname, location.search));
            if dom.has_class(target, &settings.active_class) {
                dom.set_hash(&href);
                dom.set_attribute(target, "tabindex", "-1");
                dom.focus(target);
            } else {
                dom.remove_attribute(target, "tabindex");
            }
        }

        for attr in EL_ARIA_ROLES {
            let state = AriaState::read(dom.attribute(el, attr).as_deref());
            if let Some(next) = state.flipped() {
                dom.set_attribute(el, attr, next);
            }
            for other in others.iter().filter(|o| *o != el) {
                let own = AriaState::read(dom.attribute(other, attr).as_deref());
                if own == AriaState::Absent {
                    continue;
                }
                if let Some(next) = state.flipped().or_else(|| own.flipped()) {
                    dom.set_attribute(other, attr, next);
                }
            }
        }

        if let Some(after) = &self.inner.after {
            after(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    #[test]
    fn aria_state_reads_and_flips() {
        assert_eq!(AriaState::read(None), AriaState::Absent);
        assert_eq!(AriaState::read(Some("")), AriaState::Absent);
        assert_eq!(AriaState::read(Some("true")), AriaState::True);
        assert_eq!(AriaState::read(Some("false")), AriaState::False);
        assert_eq!(AriaState::read(Some("mixed")), AriaState::False);
        assert_eq!(AriaState::Absent.flipped(), None);
        assert_eq!(AriaState::True.flipped(), Some("false"));
        assert_eq!(AriaState::False.flipped(), Some("true"));
    }

    #[test]
    fn empty_settings_fall_back_to_defaults() {
        let settings: ToggleSettings =
            serde_json::from_str(r#"{"selector": "", "activeClass": "is-open"}"#).unwrap();
        let settings = settings.resolved();
        assert_eq!(settings.selector, SELECTOR);
        assert_eq!(settings.active_class, "is-open");
        assert_eq!(settings.inactive_class, INACTIVE_CLASS);
        assert_eq!(settings.namespace, NAMESPACE);
    }

    #[test]
    fn href_resolution_is_replaced_by_aria_controls() {
        let dom = MemoryDom::new();
        let body = dom.body_id();
        let by_hash = dom.element(&body, "div", &[("id", "panel")]);
        let by_id = dom.element(&body, "div", &[("id", "drawer")]);
        let both = dom.element(
            &body,
            "a",
            &[("href", "#panel"), ("aria-controls", "drawer")],
        );
        let hash_only = dom.element(&body, "a", &[("href", "#panel")]);
        let dangling = dom.element(&body, "a", &[("href", "#panel"), ("aria-controls", "nope")]);

        let toggle = Toggle::new(&dom, &ToggleRegistry::new(), ToggleConfig::default());
        assert_eq!(toggle.resolve_target(&both), Some(by_id));
        assert_eq!(toggle.resolve_target(&hash_only), Some(by_hash));
        assert_eq!(toggle.resolve_target(&dangling), None);
    }

    #[test]
    fn hooks_see_the_current_state() {
        let dom = MemoryDom::new();
        let body = dom.body_id();
        let target = dom.element(&body, "div", &[("id", "t"), ("class", "hidden")]);
        let trigger = dom.element(
            &body,
            "button",
            &[("data-js", "toggle"), ("aria-controls", "t")],
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (before_log, after_log) = (Rc::clone(&seen), Rc::clone(&seen));
        let config = ToggleConfig::default()
            .before(move |t: &Toggle<MemoryDom>| {
                let state = t.state().unwrap();
                before_log.borrow_mut().push(("before", t.is_active(&state.target)));
            })
            .after(move |t: &Toggle<MemoryDom>| {
                let state = t.state().unwrap();
                after_log.borrow_mut().push(("after", t.is_active(&state.target)));
            });
        let _toggle = Toggle::new(&dom, &ToggleRegistry::new(), config);
        assert!(!dom.click(&trigger));
        assert_eq!(*seen.borrow(), vec![("before", false), ("after", true)]);
        assert!(!dom.has_class(&target, "hidden"));
    }
}
