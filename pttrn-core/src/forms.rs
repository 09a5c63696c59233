//! Form validation on top of native constraint validation.
//!
//! Required fields are checked on blur and on submit. An invalid field gets a
//! message element (localized when a string is configured, otherwise the
//! browser's own message), `aria-invalid` and `aria-describedby`; its
//! container and the form get the error class. Submission only reaches the
//! custom submit handler when every field is valid.

use crate::dom::{Dom, Event, EventKind, Handler};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// `(attribute, value)` set on injected messages.
pub const ERROR_MESSAGE_ATTR: (&str, &str) = ("aria-live", "polite");
/// `(attribute, value)` set on invalid inputs.
pub const ERROR_INPUT_ATTR: (&str, &str) = ("aria-invalid", "true");
pub const ERROR_LABEL_ATTR: &str = "aria-describedby";
/// Checkbox groups whose checked values are joined into another input.
pub const JOIN_VALUES_ATTR: &str = "data-js-join-values";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FormClasses {
    pub error_message: String,
    pub error_container: String,
    pub error_form: String,
}

impl Default for FormClasses {
    fn default() -> Self {
        Self {
            error_message: "error-message".to_string(),
            error_container: "error".to_string(),
            error_form: "error".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FormSelectors {
    pub required: String,
    /// Ancestor that receives the message; the field's parent when unset.
    pub error_message_parent: Option<String>,
}

impl Default for FormSelectors {
    fn default() -> Self {
        Self {
            required: "[required]".to_string(),
            error_message_parent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Localized messages: `VALID_REQUIRED` and `VALID_<TYPE>_INVALID`.
    pub strings: BTreeMap<String, String>,
    pub classes: FormClasses,
    pub selectors: FormSelectors,
    /// Tag of the injected message element.
    pub message_tag: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            strings: BTreeMap::new(),
            classes: FormClasses::default(),
            selectors: FormSelectors::default(),
            message_tag: "div".to_string(),
        }
    }
}

struct FormsInner<D: Dom> {
    dom: D,
    form: D::Node,
    settings: RefCell<FormSettings>,
    submit: RefCell<Option<Handler<D::Node>>>,
}

/// A validated form. Clones share state.
pub struct Forms<D: Dom> {
    inner: Rc<FormsInner<D>>,
}

impl<D: Dom> Clone for Forms<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom> fmt::Debug for Forms<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forms")
            .field("form", &self.inner.form)
            .field("settings", &self.inner.settings.borrow())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Forms<D> {
    /// Takes over validation of `form` and sets `novalidate` on it.
    pub fn new(dom: &D, form: D::Node, settings: FormSettings) -> Self {
        dom.set_attribute(&form, "novalidate", "true");
        Self {
            inner: Rc::new(FormsInner {
                dom: dom.clone(),
                form,
                settings: RefCell::new(settings),
                submit: RefCell::new(None),
            }),
        }
    }

    #[must_use]
    pub fn form(&self) -> &D::Node {
        &self.inner.form
    }

    #[must_use]
    pub fn settings(&self) -> FormSettings {
        self.inner.settings.borrow().clone()
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut FormSettings)) {
        update(&mut *self.inner.settings.borrow_mut());
    }

    /// Handler run for valid submissions.
    pub fn on_submit(&self, handler: impl Fn(&Event<D::Node>) + 'static) {
        self.inner.submit.replace(Some(Rc::new(handler)));
    }

    #[must_use]
    pub fn required_elements(&self) -> Vec<D::Node> {
        let selector = self.inner.settings.borrow().selectors.required.clone();
        self.inner
            .dom
            .query_selector_all(Some(&self.inner.form), &selector)
    }

    /// Binds focus/blur on required fields, the submit listener and, when the
    /// form holds `data-js-join-values` groups, the join-values click listener.
    pub fn watch(&self) -> &Self {
        let dom = &self.inner.dom;
        for el in self.required_elements() {
            let this = self.clone();
            let node = el.clone();
            dom.add_listener(
                &el,
                EventKind::Focus,
                Rc::new(move |_: &Event<D::Node>| this.reset(&node)),
            );
            let this = self.clone();
            let node = el.clone();
            dom.add_listener(
                &el,
                EventKind::Blur,
                Rc::new(move |_: &Event<D::Node>| {
                    if !this.inner.dom.validity(&node).valid() {
                        this.highlight(&node);
                    }
                }),
            );
        }

        let this = self.clone();
        dom.add_listener(
            &self.inner.form,
            EventKind::Submit,
            Rc::new(move |event: &Event<D::Node>| {
                event.prevent_default();
                if !this.valid() {
                    log::debug!("form submission blocked by invalid fields");
                    return;
                }
                let handler = this.inner.submit.borrow().clone();
                if let Some(handler) = handler {
                    handler(event);
                }
            }),
        );

        let join_selector = format!("[{JOIN_VALUES_ATTR}]");
        if dom
            .query_selector(Some(&self.inner.form), &join_selector)
            .is_some()
        {
            let this = self.clone();
            dom.add_listener(
                &self.inner.form,
                EventKind::Click,
                Rc::new(move |event: &Event<D::Node>| {
                    this.join_values(event);
                }),
            );
        }
        self
    }

    /// Validates every required field, refreshing their messages. Returns the
    /// form's overall validity.
    pub fn valid(&self) -> bool {
        let dom = &self.inner.dom;
        let validity = dom.check_validity(&self.inner.form);
        for el in self.required_elements() {
            self.reset(&el);
            if !dom.validity(&el).valid() {
                self.highlight(&el);
            }
        }
        // A later valid field's reset clears the form class an earlier one set.
        if !validity {
            let class = self.inner.settings.borrow().classes.error_form.clone();
            dom.add_class(&self.inner.form, &class);
        }
        validity
    }

    fn container(&self, el: &D::Node) -> Option<D::Node> {
        let dom = &self.inner.dom;
        let parent_selector = self
            .inner
            .settings
            .borrow()
            .selectors
            .error_message_parent
            .clone();
        parent_selector
            .and_then(|selector| dom.closest(el, &selector))
            .or_else(|| dom.parent(el))
    }

    /// Removes the message, error classes and ARIA state of `el`.
    pub fn reset(&self, el: &D::Node) {
        let dom = &self.inner.dom;
        let Some(container) = self.container(el) else {
            return;
        };
        let classes = self.inner.settings.borrow().classes.clone();

        dom.remove_class(&container, &classes.error_container);
        if let Some(message) =
            dom.query_selector(Some(&container), &format!(".{}", classes.error_message))
        {
            dom.remove_node(&message);
        }
        if let Some(form) = dom.closest(&container, "form") {
            dom.remove_class(&form, &classes.error_form);
        }
        dom.remove_attribute(el, ERROR_INPUT_ATTR.0);
        dom.remove_attribute(el, ERROR_LABEL_ATTR);
    }

    /// The message shown for an invalid `el`.
    #[must_use]
    pub fn message_for(&self, el: &D::Node) -> String {
        let dom = &self.inner.dom;
        let validity = dom.validity(el);
        let settings = self.inner.settings.borrow();
        let type_key = format!("VALID_{}_INVALID", dom.input_type(el).to_ascii_uppercase());

        let required = settings
            .strings
            .get("VALID_REQUIRED")
            .filter(|_| validity.value_missing);
        let by_type = settings
            .strings
            .get(&type_key)
            .filter(|_| !validity.valid());
        required
            .or(by_type)
            .cloned()
            .unwrap_or(validity.message)
    }

    /// Injects the validity message for `el` and marks it invalid.
    pub fn highlight(&self, el: &D::Node) {
        let dom = &self.inner.dom;
        let Some(container) = self.container(el) else {
            return;
        };
        let (classes, tag) = {
            let settings = self.inner.settings.borrow();
            (settings.classes.clone(), settings.message_tag.clone())
        };
        let Some(message) = dom.create_element(&tag) else {
            return;
        };
        let id = format!(
            "{}-{}",
            dom.attribute(el, "id").unwrap_or_default(),
            classes.error_message
        );

        dom.set_inner_html(&message, &self.message_for(el));
        dom.set_attribute(&message, "id", &id);
        dom.set_attribute(&message, ERROR_MESSAGE_ATTR.0, ERROR_MESSAGE_ATTR.1);
        dom.add_class(&message, &classes.error_message);

        dom.add_class(&container, &classes.error_container);
        dom.prepend_child(&container, &message);
        if let Some(form) = dom.closest(&container, "form") {
            dom.add_class(&form, &classes.error_form);
        }

        dom.set_attribute(el, ERROR_INPUT_ATTR.0, ERROR_INPUT_ATTR.1);
        dom.set_attribute(el, ERROR_LABEL_ATTR, &id);
    }

    /// Writes the comma-joined values of the checked boxes in the clicked
    /// checkbox's `data-js-join-values` group into the element the group names.
    pub fn join_values(&self, event: &Event<D::Node>) -> Option<D::Node> {
        let dom = &self.inner.dom;
        let el = event.target();
        if !dom.matches(el, r#"input[type="checkbox"]"#) {
            return None;
        }
        let group = dom.closest(el, &format!("[{JOIN_VALUES_ATTR}]"))?;
        let target_selector = dom.attribute(&group, JOIN_VALUES_ATTR)?;
        let target = dom.query_selector(None, &target_selector)?;

        let joined = dom
            .query_selector_all(Some(&group), r#"input[type="checkbox"]"#)
            .iter()
            .filter(|cb| dom.is_checked(cb))
            .map(|cb| dom.value(cb))
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        dom.set_value(&target, &joined);
        Some(target)
    }
}
