//! Copy-to-clipboard buttons.
//!
//! `<button data-js="copy" data-copy="share-url" aria-pressed="false">` copies
//! the value of `<input data-copy-target="share-url">`. The button reports
//! `aria-pressed="true"` for [`NOTIFY_TIMEOUT_MS`] after a successful copy.

use crate::dom::{Dom, Event, EventKind, TimerId, delegate_click};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub const SELECTOR: &str = r#"[data-js*="copy"]"#;
pub const TARGETS: &str = "[data-copy-target]";
pub const ARIA: &str = "aria-pressed";
pub const NOTIFY_TIMEOUT_MS: u32 = 1500;

struct CopyInner<D: Dom> {
    dom: D,
    /// One pending reset per trigger.
    timers: RefCell<Vec<(D::Node, TimerId)>>,
}

pub struct Copy<D: Dom> {
    inner: Rc<CopyInner<D>>,
}

impl<D: Dom> Clone for Copy<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom> fmt::Debug for Copy<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Copy")
            .field("pending", &self.inner.timers.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Copy<D> {
    /// Selects copy targets on focus or click and binds the delegated trigger
    /// listener on `<body>`.
    pub fn new(dom: &D) -> Self {
        let this = Self {
            inner: Rc::new(CopyInner {
                dom: dom.clone(),
                timers: RefCell::new(Vec::new()),
            }),
        };

        for item in dom.query_selector_all(None, TARGETS) {
            for kind in [EventKind::Focus, EventKind::Click] {
                let selector = dom.clone();
                let node = item.clone();
                dom.add_listener(
                    &item,
                    kind,
                    Rc::new(move |_: &Event<D::Node>| selector.select_text(&node)),
                );
            }
        }

        let handler = this.clone();
        delegate_click(dom, SELECTOR, move |event| handler.click(event.target()));
        this
    }

    fn click(&self, el: &D::Node) {
        let dom = &self.inner.dom;
        dom.set_attribute(el, ARIA, "false");
        let key = dom.attribute(el, "data-copy").unwrap_or_default();
        if !self.copy(&key) {
            return;
        }
        dom.set_attribute(el, ARIA, "true");
        self.rearm(el);
    }

    fn rearm(&self, el: &D::Node) {
        let dom = &self.inner.dom;
        let previous = {
            let mut timers = self.inner.timers.borrow_mut();
            timers
                .iter()
                .position(|(node, _)| node == el)
                .map(|idx| timers.remove(idx).1)
        };
        if let Some(id) = previous {
            dom.clear_timeout(id);
        }

        let weak: Weak<CopyInner<D>> = Rc::downgrade(&self.inner);
        let node = el.clone();
        let id = dom.set_timeout(
            NOTIFY_TIMEOUT_MS,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.dom.set_attribute(&node, ARIA, "false");
                inner.timers.borrow_mut().retain(|(n, _)| *n != node);
            }),
        );
        self.inner.timers.borrow_mut().push((el.clone(), id));
    }

    /// Selects `[data-copy-target="<key>"]` and writes its value to the
    /// clipboard. Returns whether a clipboard mechanism accepted it.
    pub fn copy(&self, key: &str) -> bool {
        let dom = &self.inner.dom;
        let selector = format!(r#"[data-copy-target="{key}"]"#);
        let Some(input) = dom.query_selector(None, &selector) else {
            log::warn!("copy target `{selector}` not found");
            return false;
        };
        dom.select_text(&input);
        dom.write_clipboard(&dom.value(&input))
    }
}
