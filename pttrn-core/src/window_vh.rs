use crate::dom::{Dom, Event, EventKind};
use std::rc::Rc;

pub const PROPERTY: &str = "--100vh";

/// Keeps a CSS custom property on `<html>` equal to the window's inner
/// height, refreshed on `load` and `resize`.
#[derive(Debug, Clone)]
pub struct WindowVh<D: Dom> {
    dom: D,
    property: String,
}

impl<D: Dom> WindowVh<D> {
    pub fn new(dom: &D, property: Option<&str>) -> Self {
        let this = Self {
            dom: dom.clone(),
            property: property
                .filter(|p| !p.is_empty())
                .unwrap_or(PROPERTY)
                .to_string(),
        };
        for kind in [EventKind::Load, EventKind::Resize] {
            let listener = this.clone();
            dom.add_window_listener(kind, Rc::new(move |_: &Event<D::Node>| listener.set()));
        }
        this
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn set(&self) {
        if let Some(root) = self.dom.document_element() {
            let height = self.dom.inner_height();
            self.dom
                .set_style_property(&root, &self.property, &format!("{height}px"));
        }
    }
}
