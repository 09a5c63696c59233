//! Dropdown menus.
//!
//! Trigger markup: `data-js="dropdown"`, `aria-controls`, `aria-expanded`,
//! optionally `data-dropdown="open"`/`"close"` to mark the primary open and
//! close controls and `data-dropdown-lock="true"` to lock page scrolling
//! while open. The target carries the matching `id`, `hidden` and
//! `aria-hidden`.

use crate::dom::Dom;
use crate::focus::FocusLoop;
use crate::registry::ToggleRegistry;
use crate::toggle::{Toggle, ToggleConfig};
use std::rc::Rc;

pub const SELECTOR: &str = r#"[data-js*="dropdown"]"#;
pub const CLOSE: &str = r#"[data-dropdown*="close"]"#;
pub const OPEN: &str = r#"[data-dropdown*="open"]"#;
pub const LOCKS: &str = r#"[data-dropdown-lock="true"]"#;
pub const LOCK_ATTR: &str = "data-dropdown-lock";
pub const OVERFLOW_CLASS: &str = "overflow-hidden";

#[derive(Debug, Clone)]
pub struct Dropdown<D: Dom> {
    toggle: Toggle<D>,
}

impl<D: Dom> Dropdown<D> {
    pub fn new(dom: &D, registry: &ToggleRegistry) -> Self {
        let focus_loop = Rc::new(FocusLoop::new(dom));
        let config = ToggleConfig::with_selector(SELECTOR)
            .after(move |toggle: &Toggle<D>| after_toggle(toggle, &focus_loop));
        Self {
            toggle: Toggle::new(dom, registry, config),
        }
    }

    #[must_use]
    pub const fn toggle(&self) -> &Toggle<D> {
        &self.toggle
    }
}

fn after_toggle<D: Dom>(toggle: &Toggle<D>, focus_loop: &FocusLoop<D>) {
    let Some(state) = toggle.state() else {
        return;
    };
    let dom = toggle.dom();
    let active = toggle.is_active(&state.target);
    let locks = dom.attribute(&state.element, LOCK_ATTR).as_deref() == Some("true");

    if active && locks {
        dom.scroll_to(0.0, 0.0);
        if let Some(body) = dom.body() {
            dom.add_class(&body, OVERFLOW_CLASS);
        }
        focus_loop.arm(&state.target, &state.focusable);
    } else {
        focus_loop.disarm(&state.target);
        let still_locked = format!(".{}", toggle.settings().active_class);
        if dom
            .query_selector(None, &format!("{SELECTOR}{LOCKS}{still_locked}"))
            .is_none()
        {
            if let Some(body) = dom.body() {
                dom.remove_class(&body, OVERFLOW_CLASS);
            }
        }
    }

    let Some(id) = dom.attribute(&state.target, "id") else {
        return;
    };
    let controls = format!(r#"[aria-controls="{id}"]"#);
    let close = dom.query_selector(None, &format!("{CLOSE}{controls}"));
    let open = dom.query_selector(None, &format!("{OPEN}{controls}"));
    match (active, close, open) {
        (true, Some(close), _) => dom.focus(&close),
        (_, _, Some(open)) => dom.focus(&open),
        _ => {}
    }
}
