use crate::dom::Dom;
use crate::registry::ToggleRegistry;
use crate::toggle::{Toggle, ToggleConfig};

pub const SELECTOR: &str = r#"[data-js*="accordion"]"#;

/// Accordion sections: a plain toggle on the accordion selector.
#[derive(Debug, Clone)]
pub struct Accordion<D: Dom> {
    toggle: Toggle<D>,
}

impl<D: Dom> Accordion<D> {
    pub fn new(dom: &D, registry: &ToggleRegistry) -> Self {
        Self {
            toggle: Toggle::new(dom, registry, ToggleConfig::with_selector(SELECTOR)),
        }
    }

    #[must_use]
    pub const fn toggle(&self) -> &Toggle<D> {
        &self.toggle
    }
}
