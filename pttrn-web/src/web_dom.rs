//! [`Dom`] over the live browser document.
//!
//! Listeners are `wasm-bindgen` closures owned by a table keyed by
//! [`ListenerId`]; removing a listener detaches it and drops its closure.
//! Timers run through `window.setTimeout` with one-shot closures.

use crate::dom;
use crate::error::WebError;
use js_sys::Reflect;
use pttrn_core::dom::{Dom, Event, EventKind, Handler, ListenerId, Location, TimerId, Validity};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Clipboard, Document, Element, EventTarget, HtmlDocument, HtmlElement, HtmlFormElement,
    HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, ValidityState, Window,
};

struct Listener {
    target: EventTarget,
    kind: EventKind,
    closure: Closure<dyn Fn(web_sys::Event)>,
}

struct WebDomInner {
    window: Window,
    document: Document,
    listeners: RefCell<HashMap<u64, Listener>>,
    /// Pending timeouts and their browser handles.
    timers: RefCell<HashMap<u64, i32>>,
    next_id: Cell<u64>,
}

/// The browser document. Clones share the listener and timer tables.
#[derive(Clone)]
pub struct WebDom {
    inner: Rc<WebDomInner>,
}

impl fmt::Debug for WebDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDom")
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("timers", &self.inner.timers.borrow().len())
            .finish_non_exhaustive()
    }
}

impl WebDom {
    /// Binds to the current window and document.
    ///
    /// # Errors
    /// Returns an error outside a browser, where there is no window or document.
    pub fn new() -> Result<Self, WebError> {
        let window = dom::window().ok_or(WebError::NoWindow)?;
        let document = window.document().ok_or(WebError::NoDocument)?;
        Ok(Self::from_parts(window, document))
    }

    #[must_use]
    pub fn from_parts(window: Window, document: Document) -> Self {
        Self {
            inner: Rc::new(WebDomInner {
                window,
                document,
                listeners: RefCell::new(HashMap::new()),
                timers: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    #[must_use]
    pub fn window(&self) -> &Window {
        &self.inner.window
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn next_id(&self) -> u64 {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        id
    }

    fn listen(&self, target: EventTarget, kind: EventKind, handler: Handler<Element>) -> ListenerId {
        // Window events have no element target; they report <html>.
        let root = self.inner.document.document_element();
        let closure = Closure::<dyn Fn(web_sys::Event)>::new(move |raw: web_sys::Event| {
            let target = raw
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .or_else(|| root.clone());
            let Some(target) = target else {
                return;
            };
            let event = Event::new(kind, target);
            handler(&event);
            if event.default_prevented() {
                raw.prevent_default();
            }
        });
        if let Err(err) =
            target.add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
        {
            log::error!("Failed to add {kind} listener: {}", dom::js_error_message(&err));
        }
        let id = self.next_id();
        self.inner.listeners.borrow_mut().insert(
            id,
            Listener {
                target,
                kind,
                closure,
            },
        );
        ListenerId(id)
    }

    fn html_element(node: &Element) -> Option<&HtmlElement> {
        node.dyn_ref::<HtmlElement>()
    }

    fn form(node: &Element) -> Option<&HtmlFormElement> {
        node.dyn_ref::<HtmlFormElement>()
    }

    /// `navigator.clipboard`, when it exists and exposes `writeText`.
    fn clipboard(&self) -> Option<Clipboard> {
        let navigator = self.inner.window.navigator();
        let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard")).ok()?;
        let write_text = Reflect::get(&clipboard, &JsValue::from_str("writeText")).ok()?;
        if !write_text.is_function() {
            return None;
        }
        clipboard.dyn_into::<Clipboard>().ok()
    }
}

fn validity_of(state: &ValidityState, message: Result<String, JsValue>) -> Validity {
    let mut validity = Validity {
        value_missing: state.value_missing(),
        type_mismatch: state.type_mismatch(),
        pattern_mismatch: state.pattern_mismatch(),
        too_short: state.too_short(),
        other_failure: false,
        message: message.unwrap_or_default(),
    };
    validity.other_failure = validity.valid() && !state.valid();
    validity
}

impl Dom for WebDom {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.inner.document.body().map(Element::from)
    }

    fn document_element(&self) -> Option<Element> {
        self.inner.document.document_element()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.inner.document.get_element_by_id(id)
    }

    fn query_selector(&self, scope: Option<&Element>, selector: &str) -> Option<Element> {
        let found = match scope {
            Some(el) => el.query_selector(selector),
            None => self.inner.document.query_selector(selector),
        };
        found.unwrap_or_else(|err| {
            log::warn!("invalid selector `{selector}`: {}", dom::js_error_message(&err));
            None
        })
    }

    fn query_selector_all(&self, scope: Option<&Element>, selector: &str) -> Vec<Element> {
        let found = match scope {
            Some(el) => el.query_selector_all(selector),
            None => self.inner.document.query_selector_all(selector),
        };
        match found {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.item(i))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect(),
            Err(err) => {
                log::warn!("invalid selector `{selector}`: {}", dom::js_error_message(&err));
                Vec::new()
            }
        }
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(err) = node.set_attribute(name, value) {
            log::warn!("Failed to set `{name}`: {}", dom::js_error_message(&err));
        }
    }

    fn remove_attribute(&self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn has_attribute(&self, node: &Element, name: &str) -> bool {
        node.has_attribute(name)
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn toggle_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().toggle(class).unwrap_or(false)
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.inner.document.create_element(tag).ok()
    }

    fn prepend_child(&self, parent: &Element, child: &Element) {
        if let Err(err) = parent.insert_before(child, parent.first_child().as_ref()) {
            log::warn!("Failed to insert element: {}", dom::js_error_message(&err));
        }
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        if let Err(err) = parent.append_child(child) {
            log::warn!("Failed to append element: {}", dom::js_error_message(&err));
        }
    }

    fn remove_node(&self, node: &Element) {
        node.remove();
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn set_value(&self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else {
            self.set_attribute(node, "value", value);
        }
    }

    fn is_checked(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlInputElement>()
            .is_some_and(HtmlInputElement::checked)
    }

    fn input_type(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.type_().to_ascii_lowercase()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.type_()
        } else if node.is_instance_of::<HtmlTextAreaElement>() {
            "textarea".to_string()
        } else {
            String::new()
        }
    }

    fn validity(&self, node: &Element) -> Validity {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            validity_of(&input.validity(), input.validation_message())
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            validity_of(&select.validity(), select.validation_message())
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            validity_of(&area.validity(), area.validation_message())
        } else {
            Validity::default()
        }
    }

    fn check_validity(&self, form: &Element) -> bool {
        Self::form(form).is_none_or(HtmlFormElement::check_validity)
    }

    fn submit_form(&self, form: &Element) {
        let Some(form) = Self::form(form) else {
            return;
        };
        if let Err(err) = form.submit() {
            log::error!("Form submission failed: {}", dom::js_error_message(&err));
        }
    }

    fn form_action(&self, form: &Element) -> String {
        Self::form(form).map_or_else(
            || form.get_attribute("action").unwrap_or_default(),
            HtmlFormElement::action,
        )
    }

    fn focus(&self, node: &Element) {
        if let Some(el) = Self::html_element(node) {
            let _ = el.focus();
        }
    }

    fn active_element(&self) -> Option<Element> {
        self.inner.document.active_element()
    }

    fn select_text(&self, node: &Element) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.select();
            let _ = input.set_selection_range(0, 99_999);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.select();
            let _ = area.set_selection_range(0, 99_999);
        }
    }

    fn write_clipboard(&self, text: &str) -> bool {
        log::debug!("copying {} characters", text.len());
        if let Some(clipboard) = self.clipboard() {
            let pending = JsFuture::from(clipboard.write_text(text));
            spawn_local(async move {
                if let Err(err) = pending.await {
                    log::warn!("clipboard write failed: {}", dom::js_error_message(&err));
                }
            });
            return true;
        }
        // execCommand copies the current selection; `text` is already selected.
        self.inner
            .document
            .dyn_ref::<HtmlDocument>()
            .and_then(|doc| doc.exec_command("copy").ok())
            .unwrap_or(false)
    }

    fn location(&self) -> Location {
        let location = self.inner.window.location();
        Location {
            href: location.href().unwrap_or_default(),
            pathname: location.pathname().unwrap_or_default(),
            search: location.search().unwrap_or_default(),
            hash: location.hash().unwrap_or_default(),
        }
    }

    fn replace_history(&self, url: &str) {
        let replaced = self
            .inner
            .window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(url)));
        if let Err(err) = replaced {
            log::warn!("Failed to replace history: {}", dom::js_error_message(&err));
        }
    }

    fn set_hash(&self, hash: &str) {
        let _ = self.inner.window.location().set_hash(hash);
    }

    fn navigate(&self, url: &str) {
        if let Err(err) = self.inner.window.location().set_href(url) {
            log::error!("Navigation to {url} failed: {}", dom::js_error_message(&err));
        }
    }

    fn scroll_to(&self, x: f64, y: f64) {
        self.inner.window.scroll_to_with_x_and_y(x, y);
    }

    fn inner_height(&self) -> f64 {
        self.inner
            .window
            .inner_height()
            .ok()
            .and_then(|height| height.as_f64())
            .unwrap_or_default()
    }

    fn set_style_property(&self, node: &Element, name: &str, value: &str) {
        if let Some(el) = Self::html_element(node) {
            let _ = el.style().set_property(name, value);
        }
    }

    fn add_listener(&self, node: &Element, kind: EventKind, handler: Handler<Element>) -> ListenerId {
        self.listen(node.clone().into(), kind, handler)
    }

    fn remove_listener(&self, _node: &Element, id: ListenerId) {
        let Some(listener) = self.inner.listeners.borrow_mut().remove(&id.0) else {
            return;
        };
        let _ = listener.target.remove_event_listener_with_callback(
            listener.kind.as_str(),
            listener.closure.as_ref().unchecked_ref(),
        );
    }

    fn add_window_listener(&self, kind: EventKind, handler: Handler<Element>) -> ListenerId {
        self.listen(self.inner.window.clone().into(), kind, handler)
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id();
        let timers = Rc::downgrade(&self.inner);
        let fire = Closure::once_into_js(move || {
            if let Some(inner) = timers.upgrade() {
                inner.timers.borrow_mut().remove(&id);
            }
            callback();
        });
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        match self
            .inner
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(fire.unchecked_ref(), delay)
        {
            Ok(handle) => {
                self.inner.timers.borrow_mut().insert(id, handle);
            }
            Err(err) => log::error!("Failed to schedule timer: {}", dom::js_error_message(&err)),
        }
        TimerId(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(handle) = self.inner.timers.borrow_mut().remove(&id.0) {
            self.inner.window.clear_timeout_with_handle(handle);
        }
    }
}
