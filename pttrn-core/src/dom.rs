//! The window and document capabilities the patterns are written against.
//!
//! `pttrn-web` implements [`Dom`] over `web-sys`; [`crate::memory::MemoryDom`]
//! implements it in memory for host targets and tests.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// DOM events the patterns listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Focus,
    Blur,
    Submit,
    Load,
    Resize,
}

impl EventKind {
    /// The DOM event type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Submit => "submit",
            Self::Load => "load",
            Self::Resize => "resize",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered to a handler. `target` is the node the event was
/// dispatched on; window events carry the document element.
#[derive(Debug)]
pub struct Event<N> {
    kind: EventKind,
    target: N,
    default_prevented: Cell<bool>,
}

impl<N> Event<N> {
    #[must_use]
    pub fn new(kind: EventKind, target: N) -> Self {
        Self {
            kind,
            target,
            default_prevented: Cell::new(false),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub const fn target(&self) -> &N {
        &self.target
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Event handler shared between the listener table and its owner.
pub type Handler<N> = Rc<dyn Fn(&Event<N>)>;

/// Handle returned by [`Dom::add_listener`], used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle returned by [`Dom::set_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Snapshot of `window.location`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub href: String,
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

/// A field's constraint validation `ValidityState`.
///
/// The flags the validator maps to messages are kept apart; every other failed
/// constraint collapses into `other_failure`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validity {
    pub value_missing: bool,
    pub type_mismatch: bool,
    pub pattern_mismatch: bool,
    pub too_short: bool,
    /// Range, step, `maxlength`, bad input or a custom error.
    pub other_failure: bool,
    /// The browser's localized validation message.
    pub message: String,
}

impl Validity {
    #[must_use]
    pub const fn valid(&self) -> bool {
        !self.value_missing
            && !self.type_mismatch
            && !self.pattern_mismatch
            && !self.too_short
            && !self.other_failure
    }
}

/// Window and document operations used by every pattern.
///
/// All methods take `&self`; implementations share their document behind
/// interior mutability, the way `web-sys` handles do. Lookups that fail return
/// `None` or an empty list and mutations on detached nodes are ignored, so the
/// patterns degrade to no-ops instead of erroring.
pub trait Dom: Clone + 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    // Tree

    fn body(&self) -> Option<Self::Node>;
    fn document_element(&self) -> Option<Self::Node>;
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    /// `querySelector` on `scope`, or on the document when `scope` is `None`.
    fn query_selector(&self, scope: Option<&Self::Node>, selector: &str) -> Option<Self::Node>;
    fn query_selector_all(&self, scope: Option<&Self::Node>, selector: &str) -> Vec<Self::Node>;
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    /// Lowercase tag name.
    fn tag_name(&self, node: &Self::Node) -> String;

    // Attributes and classes

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, node: &Self::Node, name: &str);
    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);
    /// Toggles `class` and reports whether it is now present.
    fn toggle_class(&self, node: &Self::Node, class: &str) -> bool;

    // Mutation

    fn create_element(&self, tag: &str) -> Option<Self::Node>;
    /// Inserts `child` before the first child of `parent`.
    fn prepend_child(&self, parent: &Self::Node, child: &Self::Node);
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    fn remove_node(&self, node: &Self::Node);
    fn set_inner_html(&self, node: &Self::Node, html: &str);
    fn inner_html(&self, node: &Self::Node) -> String;

    // Form controls

    fn value(&self, node: &Self::Node) -> String;
    fn set_value(&self, node: &Self::Node, value: &str);
    fn is_checked(&self, node: &Self::Node) -> bool;
    fn is_disabled(&self, node: &Self::Node) -> bool {
        self.has_attribute(node, "disabled")
    }
    /// The control's `type`, lowercase; `select-one`/`textarea` for those tags.
    fn input_type(&self, node: &Self::Node) -> String;
    fn validity(&self, node: &Self::Node) -> Validity;
    /// `form.checkValidity()`.
    fn check_validity(&self, form: &Self::Node) -> bool {
        self.query_selector_all(Some(form), "input, select, textarea")
            .iter()
            .all(|el| self.validity(el).valid())
    }
    /// Native submission, bypassing submit listeners.
    fn submit_form(&self, form: &Self::Node);
    /// The form's resolved `action` URL.
    fn form_action(&self, form: &Self::Node) -> String {
        self.attribute(form, "action").unwrap_or_default()
    }

    // Focus and selection

    fn focus(&self, node: &Self::Node);
    fn active_element(&self) -> Option<Self::Node>;
    /// `select()` plus `setSelectionRange(0, 99999)`.
    fn select_text(&self, node: &Self::Node);
    /// Writes to the clipboard; `false` when no clipboard mechanism exists.
    fn write_clipboard(&self, text: &str) -> bool;

    // Window

    fn location(&self) -> Location;
    /// Replaces the current history entry with `url`.
    fn replace_history(&self, url: &str);
    fn set_hash(&self, hash: &str);
    fn navigate(&self, url: &str);
    fn scroll_to(&self, x: f64, y: f64);
    fn inner_height(&self) -> f64;
    fn set_style_property(&self, node: &Self::Node, name: &str, value: &str);

    // Events and timers

    fn add_listener(
        &self,
        node: &Self::Node,
        kind: EventKind,
        handler: Handler<Self::Node>,
    ) -> ListenerId;
    fn remove_listener(&self, node: &Self::Node, id: ListenerId);
    fn add_window_listener(&self, kind: EventKind, handler: Handler<Self::Node>) -> ListenerId;
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId;
    fn clear_timeout(&self, id: TimerId);
}

/// Binds one click listener on `<body>` that only forwards events whose target
/// matches `selector`. Returns `None` when the document has no body.
pub fn delegate_click<D: Dom>(
    dom: &D,
    selector: &str,
    handler: impl Fn(&Event<D::Node>) + 'static,
) -> Option<ListenerId> {
    let body = dom.body()?;
    let matcher = dom.clone();
    let selector = selector.to_string();
    Some(dom.add_listener(
        &body,
        EventKind::Click,
        Rc::new(move |event: &Event<D::Node>| {
            if matcher.matches(event.target(), &selector) {
                handler(event);
            }
        }),
    ))
}
