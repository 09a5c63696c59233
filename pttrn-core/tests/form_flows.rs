use pttrn_core::dom::{Dom, Event, Handler};
use pttrn_core::memory::{MemoryDom, NodeId};
use pttrn_core::patterns::{Patterns, Services};
use pttrn_core::{FormSettings, Forms, PatternsConfig};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Question {
    dom: MemoryDom,
    form: NodeId,
    container: NodeId,
    input: NodeId,
}

fn question(data_js: &str, action: &str) -> Question {
    let dom = MemoryDom::new();
    let form = dom.element(
        &dom.body_id(),
        "form",
        &[("data-js", data_js), ("action", action)],
    );
    let container = dom.element(&form, "div", &[("class", "c-question__container")]);
    let label = dom.element(&container, "label", &[("for", "zip")]);
    let input = dom.element(
        &label,
        "input",
        &[("id", "zip"), ("name", "zip"), ("required", ""), ("pattern", "[0-9]{5}")],
    );
    Question {
        dom,
        form,
        container,
        input,
    }
}

fn messages(dom: &MemoryDom, container: &NodeId) -> Vec<NodeId> {
    dom.query_selector_all(Some(container), ".error-message")
}

#[test]
fn empty_required_field_blocks_submission_and_focus_clears_it() {
    init_logging();
    let Question {
        dom,
        form,
        container,
        input,
    } = question("validate", "/apply");
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    patterns.validate(None, None).unwrap();
    assert_eq!(dom.attribute(&form, "novalidate").as_deref(), Some("true"));

    assert!(!dom.submit(&form));
    assert!(dom.submitted_forms().is_empty());

    let injected = messages(&dom, &container);
    assert_eq!(injected.len(), 1);
    let message = injected[0];
    assert_eq!(dom.children(&container).first(), Some(&message));
    assert_eq!(dom.attribute(&message, "aria-live").as_deref(), Some("polite"));
    assert_eq!(dom.attribute(&message, "id").as_deref(), Some("zip-error-message"));
    assert_eq!(dom.inner_html(&message), "Please fill out this field.");
    assert_eq!(dom.attribute(&input, "aria-invalid").as_deref(), Some("true"));
    assert_eq!(
        dom.attribute(&input, "aria-describedby").as_deref(),
        Some("zip-error-message")
    );
    assert!(dom.has_class(&container, "error"));
    assert!(dom.has_class(&form, "error"));

    dom.focus(&input);
    assert!(messages(&dom, &container).is_empty());
    assert!(!dom.has_class(&container, "error"));
    assert!(!dom.has_class(&form, "error"));
    assert_eq!(dom.attribute(&input, "aria-invalid"), None);
}

#[test]
fn resubmitting_keeps_a_single_message() {
    init_logging();
    let Question {
        dom,
        form,
        container,
        ..
    } = question("validate", "/apply");
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    patterns.validate(None, None).unwrap();

    dom.submit(&form);
    dom.submit(&form);
    assert_eq!(messages(&dom, &container).len(), 1);
}

#[test]
fn blur_highlights_with_localized_strings() {
    init_logging();
    let Question {
        dom,
        form,
        container,
        input,
    } = question("validate", "/apply");
    let settings = FormSettings {
        strings: BTreeMap::from([(
            "VALID_TEXT_INVALID".to_string(),
            "Enter a five digit ZIP code.".to_string(),
        )]),
        ..FormSettings::default()
    };
    let forms = Forms::new(&dom, form, settings);
    forms.update_settings(|s| {
        s.selectors.error_message_parent = Some(".c-question__container".to_string());
    });
    forms.watch();

    dom.focus(&input);
    dom.set_value(&input, "123");
    dom.blur(&input);

    let injected = messages(&dom, &container);
    assert_eq!(injected.len(), 1);
    assert_eq!(dom.inner_html(&injected[0]), "Enter a five digit ZIP code.");
}

#[test]
fn range_underflow_is_reported_on_the_field() {
    init_logging();
    let dom = MemoryDom::new();
    let form = dom.element(&dom.body_id(), "form", &[("action", "/apply")]);
    let container = dom.element(&form, "div", &[]);
    let guests = dom.element(
        &container,
        "input",
        &[
            ("id", "guests"),
            ("type", "number"),
            ("min", "1"),
            ("required", ""),
        ],
    );
    dom.set_value(&guests, "0");
    let forms = Forms::new(&dom, form, FormSettings::default());
    forms.watch();

    assert!(!dom.submit(&form));
    let injected = messages(&dom, &container);
    assert_eq!(injected.len(), 1);
    assert_eq!(
        dom.inner_html(&injected[0]),
        "Value must be greater than or equal to 1."
    );
    assert_eq!(dom.attribute(&guests, "aria-invalid").as_deref(), Some("true"));
    assert!(dom.has_class(&form, "error"));
}

#[test]
fn custom_validity_is_highlighted_on_blur() {
    init_logging();
    let Question {
        dom,
        form,
        container,
        input,
    } = question("validate", "/apply");
    let forms = Forms::new(&dom, form, FormSettings::default());
    forms.watch();

    dom.set_value(&input, "10007");
    dom.set_custom_validity(&input, "We do not deliver to this ZIP code.");
    dom.focus(&input);
    dom.blur(&input);

    let injected = messages(&dom, &container);
    assert_eq!(injected.len(), 1);
    assert_eq!(
        dom.inner_html(&injected[0]),
        "We do not deliver to this ZIP code."
    );
    assert!(!forms.valid());
}

#[test]
fn later_valid_field_keeps_the_form_error_class() {
    init_logging();
    let dom = MemoryDom::new();
    let form = dom.element(&dom.body_id(), "form", &[("action", "/apply")]);
    let first = dom.element(&form, "div", &[]);
    dom.element(&first, "input", &[("id", "name"), ("required", "")]);
    let second = dom.element(&form, "div", &[]);
    let email = dom.element(
        &second,
        "input",
        &[("id", "email"), ("type", "email"), ("required", "")],
    );
    dom.set_value(&email, "someone@example.test");
    let forms = Forms::new(&dom, form, FormSettings::default());

    assert!(!forms.valid());
    assert_eq!(messages(&dom, &first).len(), 1);
    assert!(messages(&dom, &second).is_empty());
    assert!(dom.has_class(&form, "error"));
}

#[test]
fn valid_submission_reaches_the_custom_handler() {
    init_logging();
    let Question {
        dom, form, input, ..
    } = question("validate", "/apply");
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let handler: Handler<NodeId> =
        Rc::new(move |_: &Event<NodeId>| counter.set(counter.get() + 1));
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    patterns.validate(None, Some(handler)).unwrap();

    dom.set_value(&input, "10007");
    dom.submit(&form);
    assert_eq!(calls.get(), 1);
    assert!(dom.submitted_forms().is_empty());
}

#[test]
fn default_handler_submits_natively() {
    init_logging();
    let Question {
        dom, form, input, ..
    } = question("validate", "/apply");
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    patterns.validate(None, None).unwrap();

    dom.set_value(&input, "10007");
    dom.submit(&form);
    assert_eq!(dom.submitted_forms(), vec![form]);
}

#[test]
fn validate_and_query_navigates_with_serialized_fields() {
    init_logging();
    let Question {
        dom, form, input, ..
    } = question("validate-and-query", "/eligibility/results");
    let household = dom.element(&form, "input", &[("name", "household"), ("type", "number")]);
    dom.set_value(&household, "3");
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    patterns.validate_and_query(None).unwrap();

    dom.set_value(&input, "10007");
    dom.submit(&form);
    assert_eq!(
        dom.navigations(),
        vec!["https://example.test/eligibility/results?zip=10007&household=3".to_string()]
    );
}
