use crate::dom::Dom;
use crate::registry::ToggleRegistry;
use crate::toggle::{Toggle, ToggleConfig};

pub const SELECTOR: &str = r#"[data-js*="search"]"#;
pub const INPUT: &str = r#"[data-js*="search__input"]"#;

/// The header search panel; focuses the search input once open.
#[derive(Debug, Clone)]
pub struct Search<D: Dom> {
    toggle: Toggle<D>,
}

impl<D: Dom> Search<D> {
    pub fn new(dom: &D, registry: &ToggleRegistry) -> Self {
        let config = ToggleConfig::with_selector(SELECTOR).after(|toggle: &Toggle<D>| {
            let dom = toggle.dom();
            let trigger = dom.query_selector(None, SELECTOR);
            let input = dom.query_selector(None, INPUT);
            if let (Some(trigger), Some(input)) = (trigger, input) {
                if toggle.is_active(&trigger) {
                    dom.focus(&input);
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
