use crate::dom::{Dom, delegate_click};
use crate::transport::{ShareData, Sharer};
use std::fmt;
use std::rc::Rc;

pub const SELECTOR: &str = r#"[data-js*="web-share"]"#;
pub const DATA_ATTR: &str = "data-web-share";

/// Called with the shared payload once the share sheet completes.
pub type ShareCallback = Rc<dyn Fn(&ShareData)>;

/// Share buttons backed by the Web Share API.
///
/// When the API is available the toggle attributes meant for the fallback
/// (`aria-controls`, `aria-expanded`) are stripped and clicks open the share
/// sheet with the JSON payload in `data-web-share`. Otherwise `fallback` runs
/// once at construction.
pub struct WebShare<D: Dom> {
    dom: D,
    sharer: Rc<dyn Sharer>,
    callback: ShareCallback,
    supported: bool,
}

impl<D: Dom> Clone for WebShare<D> {
    fn clone(&self) -> Self {
        Self {
            dom: self.dom.clone(),
            sharer: Rc::clone(&self.sharer),
            callback: Rc::clone(&self.callback),
            supported: self.supported,
        }
    }
}

impl<D: Dom> fmt::Debug for WebShare<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebShare")
            .field("supported", &self.supported)
            .finish_non_exhaustive()
    }
}

impl<D: Dom> WebShare<D> {
    pub fn new(
        dom: &D,
        sharer: Rc<dyn Sharer>,
        selector: &str,
        callback: ShareCallback,
        fallback: impl FnOnce(),
    ) -> Self {
        let supported = sharer.supported();
        let this = Self {
            dom: dom.clone(),
            sharer,
            callback,
            supported,
        };

        if !supported {
            log::debug!("navigator.share unavailable, using fallback");
            fallback();
            return this;
        }

        for item in dom.query_selector_all(None, selector) {
            dom.remove_attribute(&item, "aria-controls");
            dom.remove_attribute(&item, "aria-expanded");
        }
        let handler = this.clone();
        delegate_click(dom, selector, move |event| {
            let raw = handler
                .dom
                .attribute(event.target(), DATA_ATTR)
                .unwrap_or_default();
            match serde_json::from_str::<ShareData>(&raw) {
                Ok(data) => handler.share(data),
                Err(err) => log::warn!("invalid {DATA_ATTR} payload: {err}"),
            }
        });
        this
    }

    #[must_use]
    pub const fn supported(&self) -> bool {
        self.supported
    }

    /// Opens the share sheet; the callback runs when sharing succeeds.
    pub fn share(&self, data: ShareData) {
        let callback = Rc::clone(&self.callback);
        let shared = data.clone();
        self.sharer.share(
            &data,
            Box::new(move |result| match result {
                Ok(()) => callback(&shared),
                Err(err) => log::warn!("share failed: {err}"),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;
    use crate::transport::{Completion, Offline};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct Recording(RefCell<Vec<ShareData>>);

    impl Sharer for Recording {
        fn supported(&self) -> bool {
            true
        }

        fn share(&self, data: &ShareData, done: Completion<()>) {
            self.0.borrow_mut().push(data.clone());
            done(Ok(()));
        }
    }

    #[test]
    fn supported_share_strips_fallback_attributes_and_shares() {
        let dom = MemoryDom::new();
        let button = dom.element(
            &dom.body_id(),
            "button",
            &[
                ("data-js", "web-share"),
                ("aria-controls", "share-fallback"),
                ("aria-expanded", "false"),
                (DATA_ATTR, r#"{"title":"Jobs","url":"https://example.test/jobs"}"#),
            ],
        );
        let sharer = Rc::new(Recording::default());
        let done = Rc::new(Cell::new(0));
        let count = Rc::clone(&done);
        let share = WebShare::new(
            &dom,
            Rc::clone(&sharer) as Rc<dyn Sharer>,
            SELECTOR,
            Rc::new(move |_: &ShareData| count.set(count.get() + 1)),
            || panic!("fallback should not run"),
        );
        assert!(share.supported());
        assert!(!dom.has_attribute(&button, "aria-controls"));
        assert!(!dom.has_attribute(&button, "aria-expanded"));

        dom.click(&button);
        assert_eq!(sharer.0.borrow()[0].title.as_deref(), Some("Jobs"));
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn unsupported_share_runs_fallback() {
        let dom = MemoryDom::new();
        let ran = Cell::new(false);
        WebShare::new(
            &dom,
            Rc::new(Offline),
            SELECTOR,
            Rc::new(|_: &ShareData| {}),
            || ran.set(true),
        );
        assert!(ran.get());
        assert_eq!(dom.listener_count(&dom.body_id(), crate::dom::EventKind::Click), 0);
    }
}
