//! In-memory [`Dom`] used on host targets and by the test suites.
//!
//! The document is an arena of element nodes. Markup set through
//! `set_inner_html` is stored verbatim and never parsed into nodes.

use crate::dom::{Dom, Event, EventKind, Handler, ListenerId, Location, TimerId, Validity};
use crate::selector::{ElementView, SelectorList};
use regex::Regex;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use url::Url;

const DEFAULT_HREF: &str = "https://example.test/";
const DEFAULT_INNER_HEIGHT: f64 = 768.0;

/// Handle to a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

type ListenerEntry = (ListenerId, EventKind, Handler<NodeId>);

struct NodeData {
    tag: String,
    attrs: SmallVec<[(String, String); 4]>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    value: String,
    checked: bool,
    html: String,
    style: Vec<(String, String)>,
    custom_error: String,
    listeners: Vec<ListenerEntry>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: SmallVec::new(),
            parent: None,
            children: Vec::new(),
            value: String::new(),
            checked: false,
            html: String::new(),
            style: Vec::new(),
            custom_error: String::new(),
            listeners: Vec::new(),
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name, value.to_string()));
        }
    }

    fn remove_attr(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        self.attrs.retain(|(k, _)| *k != name);
    }

    fn classes(&self) -> Vec<String> {
        self.attr("class")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    fn set_classes(&mut self, classes: &[String]) {
        self.set_attr("class", &classes.join(" "));
    }
}

struct PendingTimer {
    id: TimerId,
    due: u64,
    callback: Box<dyn FnOnce()>,
}

struct Inner {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    /// `None` only when the default location failed to parse.
    location: Option<Url>,
    history: Vec<String>,
    navigations: Vec<String>,
    focused: Option<NodeId>,
    selected: Option<NodeId>,
    clipboard: Option<String>,
    clipboard_supported: bool,
    submitted: Vec<NodeId>,
    scroll: (f64, f64),
    inner_height: f64,
    window_listeners: Vec<ListenerEntry>,
    timers: Vec<PendingTimer>,
    now_ms: u64,
    next_id: u64,
}

impl Inner {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
        self.node_mut(id).parent = None;
    }

    /// Descendants of `scope` in document order; the whole document, root
    /// included, when `scope` is `None`.
    fn descendants(&self, scope: Option<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match scope {
            Some(id) => self.node(id).children.iter().rev().copied().collect(),
            None => vec![self.root],
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cursor = self.node(id).parent;
        while let Some(parent) = cursor {
            path.push(parent);
            cursor = self.node(parent).parent;
        }
        path
    }

    fn listeners_for(&self, id: NodeId, kind: EventKind) -> Vec<(ListenerId, Handler<NodeId>)> {
        self.node(id)
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(lid, _, h)| (*lid, Rc::clone(h)))
            .collect()
    }

    fn is_listening(&self, id: NodeId, listener: ListenerId) -> bool {
        self.node(id).listeners.iter().any(|(lid, _, _)| *lid == listener)
    }

    fn view(&self, id: NodeId) -> View<'_> {
        View { inner: self, id }
    }
}

struct View<'a> {
    inner: &'a Inner,
    id: NodeId,
}

impl ElementView for View<'_> {
    fn tag(&self) -> &str {
        &self.inner.node(self.id).tag
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.inner.node(self.id).attr(name)
    }

    fn parent_element(&self) -> Option<Self> {
        self.inner.node(self.id).parent.map(|id| View {
            inner: self.inner,
            id,
        })
    }
}

fn parse_selector(selector: &str) -> Option<SelectorList> {
    match SelectorList::parse(selector) {
        Ok(list) => Some(list),
        Err(err) => {
            log::warn!("{err}");
            None
        }
    }
}

/// An in-memory window and document.
#[derive(Clone)]
pub struct MemoryDom {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemoryDom")
            .field("nodes", &inner.nodes.len())
            .field("location", &inner.location.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// An empty `<html><body></body></html>` document at `https://example.test/`.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = vec![NodeData::new("html"), NodeData::new("body")];
        nodes[0].children.push(NodeId(1));
        nodes[1].parent = Some(NodeId(0));
        let location = Url::parse(DEFAULT_HREF).ok();
        Self {
            inner: Rc::new(RefCell::new(Inner {
                nodes,
                root: NodeId(0),
                body: NodeId(1),
                location,
                history: Vec::new(),
                navigations: Vec::new(),
                focused: None,
                selected: None,
                clipboard: None,
                clipboard_supported: true,
                submitted: Vec::new(),
                scroll: (0.0, 0.0),
                inner_height: DEFAULT_INNER_HEIGHT,
                window_listeners: Vec::new(),
                timers: Vec::new(),
                now_ms: 0,
                next_id: 0,
            })),
        }
    }

    #[must_use]
    pub fn body_id(&self) -> NodeId {
        self.inner.borrow().body
    }

    /// Creates `<tag attrs...>` as the last child of `parent`.
    pub fn element(&self, parent: &NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId(inner.nodes.len());
        let mut data = NodeData::new(tag);
        for (name, value) in attrs {
            data.set_attr(name, value);
        }
        data.parent = Some(*parent);
        inner.nodes.push(data);
        inner.node_mut(*parent).children.push(id);
        id
    }

    /// Points `window.location` at `href`.
    ///
    /// # Errors
    ///
    /// Returns the parse error when `href` is not an absolute URL.
    pub fn set_location(&self, href: &str) -> Result<(), url::ParseError> {
        let url = Url::parse(href)?;
        self.inner.borrow_mut().location = Some(url);
        Ok(())
    }

    pub fn set_checked(&self, node: &NodeId, checked: bool) {
        self.inner.borrow_mut().node_mut(*node).checked = checked;
    }

    /// `setCustomValidity`: a non-empty message marks the field invalid.
    pub fn set_custom_validity(&self, node: &NodeId, message: &str) {
        self.inner.borrow_mut().node_mut(*node).custom_error = message.to_string();
    }

    pub fn set_clipboard_supported(&self, supported: bool) {
        self.inner.borrow_mut().clipboard_supported = supported;
    }

    #[must_use]
    pub fn clipboard(&self) -> Option<String> {
        self.inner.borrow().clipboard.clone()
    }

    /// The node last passed to `select_text`.
    #[must_use]
    pub fn selected(&self) -> Option<NodeId> {
        self.inner.borrow().selected
    }

    /// URLs written by `replace_history`, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.inner.borrow().history.clone()
    }

    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.inner.borrow().navigations.clone()
    }

    /// Forms submitted natively, in order.
    #[must_use]
    pub fn submitted_forms(&self) -> Vec<NodeId> {
        self.inner.borrow().submitted.clone()
    }

    #[must_use]
    pub fn scroll_position(&self) -> (f64, f64) {
        self.inner.borrow().scroll
    }

    #[must_use]
    pub fn style_property(&self, node: &NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .node(*node)
            .style
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    #[must_use]
    pub fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.inner.borrow().node(*node).children.clone()
    }

    /// Number of listeners currently bound to `node`.
    #[must_use]
    pub fn listener_count(&self, node: &NodeId, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .node(*node)
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    fn dispatch(&self, path: &[NodeId], event: &Event<NodeId>) {
        for id in path {
            let handlers = self.inner.borrow().listeners_for(*id, event.kind());
            for (listener, handler) in handlers {
                // Listeners removed by an earlier handler no longer fire.
                if self.inner.borrow().is_listening(*id, listener) {
                    handler(event);
                }
            }
        }
    }

    /// Dispatches a bubbling click on `node`. Returns `false` when a listener
    /// prevented the default action.
    pub fn click(&self, node: &NodeId) -> bool {
        let path = self.inner.borrow().path_to_root(*node);
        let event = Event::new(EventKind::Click, *node);
        self.dispatch(&path, &event);
        !event.default_prevented()
    }

    /// Moves focus away from `node` when it holds it.
    pub fn blur(&self, node: &NodeId) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.focused != Some(*node) {
                return;
            }
            inner.focused = None;
        }
        self.dispatch(&[*node], &Event::new(EventKind::Blur, *node));
    }

    /// Dispatches `submit` on `form`; an unprevented submit is recorded as a
    /// native submission. Returns whether the form was submitted.
    pub fn submit(&self, form: &NodeId) -> bool {
        let path = self.inner.borrow().path_to_root(*form);
        let event = Event::new(EventKind::Submit, *form);
        self.dispatch(&path, &event);
        if event.default_prevented() {
            return false;
        }
        self.submit_form(form);
        true
    }

    fn dispatch_window(&self, kind: EventKind) {
        let (root, handlers) = {
            let inner = self.inner.borrow();
            let handlers: Vec<_> = inner
                .window_listeners
                .iter()
                .filter(|(_, k, _)| *k == kind)
                .map(|(_, _, h)| Rc::clone(h))
                .collect();
            (inner.root, handlers)
        };
        let event = Event::new(kind, root);
        for handler in handlers {
            handler(&event);
        }
    }

    pub fn load(&self) {
        self.dispatch_window(EventKind::Load);
    }

    pub fn resize(&self, inner_height: f64) {
        self.inner.borrow_mut().inner_height = inner_height;
        self.dispatch_window(EventKind::Resize);
    }

    /// Advances the virtual clock, running every timer that falls due.
    pub fn advance(&self, ms: u64) {
        let target = self.inner.borrow().now_ms + ms;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                let due = inner
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id.0))
                    .map(|(idx, _)| idx);
                due.map(|idx| {
                    let timer = inner.timers.remove(idx);
                    inner.now_ms = timer.due;
                    timer.callback
                })
            };
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
        self.inner.borrow_mut().now_ms = target;
    }
}

fn compute_validity(node: &NodeData) -> Validity {
    let mut validity = Validity::default();
    if !matches!(node.tag.as_str(), "input" | "select" | "textarea")
        || node.attr("disabled").is_some()
    {
        return validity;
    }
    let kind = node.attr("type").unwrap_or("text").to_ascii_lowercase();
    let checkable = node.tag == "input" && matches!(kind.as_str(), "checkbox" | "radio");
    let required = node.attr("required").is_some();

    if required && checkable && !node.checked {
        validity.value_missing = true;
        validity.message = "Please check this box if you want to proceed.".to_string();
        return validity;
    }
    if required && !checkable && node.value.is_empty() {
        validity.value_missing = true;
        validity.message = "Please fill out this field.".to_string();
        return validity;
    }
    if !node.custom_error.is_empty() {
        validity.other_failure = true;
        validity.message = node.custom_error.clone();
        return validity;
    }
    if node.value.is_empty() || checkable {
        return validity;
    }

    let value = node.value.as_str();
    if node.tag == "input" {
        let mismatch = match kind.as_str() {
            "email" => !value
                .split_once('@')
                .is_some_and(|(user, host)| !user.is_empty() && !host.is_empty())
                || value.chars().any(char::is_whitespace),
            "url" => Url::parse(value).is_err(),
            "number" => value.parse::<f64>().is_err(),
            _ => false,
        };
        if mismatch {
            validity.type_mismatch = true;
            validity.message = match kind.as_str() {
                "email" => "Please enter an email address.",
                "url" => "Please enter a URL.",
                _ => "Please enter a number.",
            }
            .to_string();
            return validity;
        }
    }
    if let Some(pattern) = node.attr("pattern") {
        if let Ok(re) = Regex::new(&format!("^(?:{pattern})$")) {
            if !re.is_match(value) {
                validity.pattern_mismatch = true;
                validity.message = "Please match the requested format.".to_string();
                return validity;
            }
        }
    }
    if let Some(min) = node.attr("minlength").and_then(|m| m.parse::<usize>().ok()) {
        if value.chars().count() < min {
            validity.too_short = true;
            validity.message =
                format!("Please lengthen this text to {min} characters or more.");
            return validity;
        }
    }
    if node.tag == "input" && kind == "number" {
        let number = value.parse::<f64>().unwrap_or_default();
        let bound = |name: &str| node.attr(name).and_then(|b| b.parse::<f64>().ok());
        if let Some(min) = bound("min").filter(|min| number < *min) {
            validity.other_failure = true;
            validity.message = format!("Value must be greater than or equal to {min}.");
            return validity;
        }
        if let Some(max) = bound("max").filter(|max| number > *max) {
            validity.other_failure = true;
            validity.message = format!("Value must be less than or equal to {max}.");
            return validity;
        }
    }
    validity
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.inner.borrow().body)
    }

    fn document_element(&self) -> Option<NodeId> {
        Some(self.inner.borrow().root)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner
            .descendants(None)
            .into_iter()
            .find(|n| inner.node(*n).attr("id") == Some(id))
    }

    fn query_selector(&self, scope: Option<&NodeId>, selector: &str) -> Option<NodeId> {
        let list = parse_selector(selector)?;
        let inner = self.inner.borrow();
        inner
            .descendants(scope.copied())
            .into_iter()
            .find(|n| list.matches(&inner.view(*n)))
    }

    fn query_selector_all(&self, scope: Option<&NodeId>, selector: &str) -> Vec<NodeId> {
        let Some(list) = parse_selector(selector) else {
            return Vec::new();
        };
        let inner = self.inner.borrow();
        inner
            .descendants(scope.copied())
            .into_iter()
            .filter(|n| list.matches(&inner.view(*n)))
            .collect()
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        parse_selector(selector).is_some_and(|list| list.matches(&self.inner.borrow().view(*node)))
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let list = parse_selector(selector)?;
        let inner = self.inner.borrow();
        inner
            .path_to_root(*node)
            .into_iter()
            .find(|n| list.matches(&inner.view(*n)))
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.inner.borrow().node(*node).parent
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.inner.borrow().node(*node).tag.clone()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .node(*node)
            .attr(&name.to_ascii_lowercase())
            .map(str::to_string)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.inner.borrow_mut().node_mut(*node).set_attr(name, value);
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        self.inner.borrow_mut().node_mut(*node).remove_attr(name);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.inner
            .borrow()
            .node(*node)
            .classes()
            .iter()
            .any(|c| c == class)
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut inner = self.inner.borrow_mut();
        let data = inner.node_mut(*node);
        let mut classes = data.classes();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            data.set_classes(&classes);
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        let mut inner = self.inner.borrow_mut();
        let data = inner.node_mut(*node);
        let mut classes = data.classes();
        if classes.iter().any(|c| c == class) {
            classes.retain(|c| c != class);
            data.set_classes(&classes);
        }
    }

    fn toggle_class(&self, node: &NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    fn create_element(&self, tag: &str) -> Option<NodeId> {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId(inner.nodes.len());
        inner.nodes.push(NodeData::new(tag));
        Some(id)
    }

    fn prepend_child(&self, parent: &NodeId, child: &NodeId) {
        let mut inner = self.inner.borrow_mut();
        inner.detach(*child);
        inner.node_mut(*parent).children.insert(0, *child);
        inner.node_mut(*child).parent = Some(*parent);
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        let mut inner = self.inner.borrow_mut();
        inner.detach(*child);
        inner.node_mut(*parent).children.push(*child);
        inner.node_mut(*child).parent = Some(*parent);
    }

    fn remove_node(&self, node: &NodeId) {
        let mut inner = self.inner.borrow_mut();
        inner.detach(*node);
        if inner.focused == Some(*node) {
            inner.focused = None;
        }
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        self.inner.borrow_mut().node_mut(*node).html = html.to_string();
    }

    fn inner_html(&self, node: &NodeId) -> String {
        self.inner.borrow().node(*node).html.clone()
    }

    fn value(&self, node: &NodeId) -> String {
        self.inner.borrow().node(*node).value.clone()
    }

    fn set_value(&self, node: &NodeId, value: &str) {
        self.inner.borrow_mut().node_mut(*node).value = value.to_string();
    }

    fn is_checked(&self, node: &NodeId) -> bool {
        self.inner.borrow().node(*node).checked
    }

    fn input_type(&self, node: &NodeId) -> String {
        let inner = self.inner.borrow();
        let data = inner.node(*node);
        match data.tag.as_str() {
            "input" => data.attr("type").unwrap_or("text").to_ascii_lowercase(),
            "select" if data.attr("multiple").is_some() => "select-multiple".to_string(),
            "select" => "select-one".to_string(),
            "textarea" => "textarea".to_string(),
            _ => String::new(),
        }
    }

    fn validity(&self, node: &NodeId) -> Validity {
        compute_validity(self.inner.borrow().node(*node))
    }

    fn submit_form(&self, form: &NodeId) {
        self.inner.borrow_mut().submitted.push(*form);
    }

    fn form_action(&self, form: &NodeId) -> String {
        let inner = self.inner.borrow();
        let action = inner.node(*form).attr("action").unwrap_or_default();
        inner
            .location
            .as_ref()
            .and_then(|base| base.join(action).ok())
            .map_or_else(|| action.to_string(), String::from)
    }

    fn focus(&self, node: &NodeId) {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            if inner.focused == Some(*node) {
                return;
            }
            inner.focused.replace(*node)
        };
        if let Some(previous) = previous {
            self.dispatch(&[previous], &Event::new(EventKind::Blur, previous));
        }
        self.dispatch(&[*node], &Event::new(EventKind::Focus, *node));
    }

    fn active_element(&self) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner.focused.or(Some(inner.body))
    }

    fn select_text(&self, node: &NodeId) {
        self.inner.borrow_mut().selected = Some(*node);
    }

    fn write_clipboard(&self, text: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.clipboard_supported {
            return false;
        }
        inner.clipboard = Some(text.to_string());
        true
    }

    fn location(&self) -> Location {
        let inner = self.inner.borrow();
        let Some(url) = &inner.location else {
            return Location::default();
        };
        Location {
            href: url.to_string(),
            pathname: url.path().to_string(),
            search: url.query().map(|q| format!("?{q}")).unwrap_or_default(),
            hash: url.fragment().map(|f| format!("#{f}")).unwrap_or_default(),
        }
    }

    fn replace_history(&self, url: &str) {
        let mut inner = self.inner.borrow_mut();
        let Some(base) = &inner.location else {
            return;
        };
        match base.join(url) {
            Ok(next) => {
                inner.history.push(next.to_string());
                inner.location = Some(next);
            }
            Err(err) => log::warn!("history url `{url}` rejected: {err}"),
        }
    }

    fn set_hash(&self, hash: &str) {
        let fragment = hash.strip_prefix('#').unwrap_or(hash);
        if let Some(location) = self.inner.borrow_mut().location.as_mut() {
            location.set_fragment((!fragment.is_empty()).then_some(fragment));
        }
    }

    fn navigate(&self, url: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.navigations.push(url.to_string());
        if let Some(next) = inner.location.as_ref().and_then(|base| base.join(url).ok()) {
            inner.location = Some(next);
        }
    }

    fn scroll_to(&self, x: f64, y: f64) {
        self.inner.borrow_mut().scroll = (x, y);
    }

    fn inner_height(&self) -> f64 {
        self.inner.borrow().inner_height
    }

    fn set_style_property(&self, node: &NodeId, name: &str, value: &str) {
        let mut inner = self.inner.borrow_mut();
        let style = &mut inner.node_mut(*node).style;
        if let Some(slot) = style.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            style.push((name.to_string(), value.to_string()));
        }
    }

    fn add_listener(&self, node: &NodeId, kind: EventKind, handler: Handler<NodeId>) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id());
        inner.node_mut(*node).listeners.push((id, kind, handler));
        id
    }

    fn remove_listener(&self, node: &NodeId, id: ListenerId) {
        self.inner
            .borrow_mut()
            .node_mut(*node)
            .listeners
            .retain(|(lid, _, _)| *lid != id);
    }

    fn add_window_listener(&self, kind: EventKind, handler: Handler<NodeId>) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id());
        inner.window_listeners.push((id, kind, handler));
        id
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = TimerId(inner.next_id());
        let due = inner.now_ms + u64::from(delay_ms);
        inner.timers.push(PendingTimer { id, due, callback });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().timers.retain(|t| t.id != id);
    }
}
