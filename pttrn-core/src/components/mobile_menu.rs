use crate::dom::Dom;
use crate::focus::FocusLoop;
use crate::registry::ToggleRegistry;
use crate::toggle::{Toggle, ToggleConfig};
use std::rc::Rc;

pub const SELECTOR: &str = r#"[data-js*="mobile-menu"]"#;
pub const CLOSE: &str = r#"[data-js-mobile-menu*="close"]"#;
pub const OPEN: &str = r#"[data-js-mobile-menu*="open"]"#;

/// The mobile navigation drawer. Opening moves focus to the drawer's close
/// control and traps it inside; closing returns it to the open control.
#[derive(Debug, Clone)]
pub struct MobileMenu<D: Dom> {
    toggle: Toggle<D>,
}

impl<D: Dom> MobileMenu<D> {
    pub fn new(dom: &D, registry: &ToggleRegistry) -> Self {
        let focus_loop = Rc::new(FocusLoop::new(dom));
        let config = ToggleConfig::with_selector(SELECTOR).after(move |toggle: &Toggle<D>| {
            let Some(state) = toggle.state() else {
                return;
            };
            let dom = toggle.dom();
            if toggle.is_active(&state.target) {
                if let Some(close) = dom.query_selector(Some(&state.target), CLOSE) {
                    dom.focus(&close);
                }
                focus_loop.arm(&state.target, &state.focusable);
            } else {
                focus_loop.disarm(&state.target);
                if let Some(open) = dom.query_selector(None, OPEN) {
                    dom.focus(&open);
                }
            }
        });
        Self {
            toggle: Toggle::new(dom, registry, config),
        }
    }

    #[must_use]
    pub const fn toggle(&self) -> &Toggle<D> {
        &self.toggle
    }
}
