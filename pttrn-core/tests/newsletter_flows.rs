use pttrn_core::PatternsConfig;
use pttrn_core::dom::Dom;
use pttrn_core::memory::{MemoryDom, NodeId};
use pttrn_core::newsletter::{self, Newsletter};
use pttrn_core::patterns::{Patterns, Services};
use pttrn_core::transport::{Completion, Offline, Transport};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Holds requests until the test answers them.
#[derive(Default)]
struct Deferred {
    pending: RefCell<Vec<(String, Completion<String>)>>,
}

impl Deferred {
    fn urls(&self) -> Vec<String> {
        self.pending.borrow().iter().map(|(url, _)| url.clone()).collect()
    }

    fn answer(&self, index: usize, body: &str) {
        let (_, done) = self.pending.borrow_mut().remove(index);
        done(Ok(body.to_string()));
    }
}

impl Transport for Deferred {
    fn get_text(&self, url: &str, done: Completion<String>) {
        self.pending.borrow_mut().push((url.to_string(), done));
    }
}

struct Signup {
    dom: MemoryDom,
    element: NodeId,
    form: NodeId,
    email: NodeId,
    warning_text: NodeId,
    success: NodeId,
    success_text: NodeId,
}

fn signup(data_js: &str) -> Signup {
    let dom = MemoryDom::new();
    let element = dom.element(&dom.body_id(), "div", &[("data-js", data_js)]);
    let form = dom.element(
        &element,
        "form",
        &[("action", "https://x.list-manage.com/subscribe/post?u=1&id=2")],
    );
    let container = dom.element(&form, "div", &[("class", "c-question__container")]);
    let email = dom.element(
        &container,
        "input",
        &[("id", "email"), ("name", "EMAIL"), ("type", "email"), ("required", "")],
    );
    let warning = dom.element(
        &element,
        "div",
        &[("data-js", "alert-warning"), ("class", "hidden"), ("aria-hidden", "true")],
    );
    let warning_text = dom.element(&warning, "p", &[("data-js-alert", "text")]);
    let success = dom.element(
        &element,
        "div",
        &[("data-js", "alert-success"), ("class", "hidden"), ("aria-hidden", "true")],
    );
    let success_text = dom.element(&success, "p", &[("data-js-alert", "text")]);
    Signup {
        dom,
        element,
        form,
        email,
        warning_text,
        success,
        success_text,
    }
}

fn attach(s: &Signup, transport: Rc<dyn Transport>) -> Newsletter<MemoryDom> {
    Newsletter::new(
        &s.dom,
        s.element,
        transport,
        &BTreeMap::new(),
        Some(".c-question__container".to_string()),
    )
    .unwrap()
}

fn is_shown(dom: &MemoryDom, alert: &NodeId) -> bool {
    !dom.has_class(alert, newsletter::HIDDEN_CLASS)
        && dom.attribute(alert, "aria-hidden").as_deref() == Some("false")
}

#[test]
fn invalid_email_never_reaches_the_list() {
    init_logging();
    let s = signup("newsletter");
    let transport = Rc::new(Deferred::default());
    let _signup = attach(&s, transport.clone());

    s.dom.set_value(&s.email, "not-an-email");
    assert!(!s.dom.submit(&s.form));
    assert!(transport.urls().is_empty());
}

#[test]
fn success_shows_the_confirmation_string() {
    init_logging();
    let s = signup("newsletter");
    let transport = Rc::new(Deferred::default());
    let _signup = attach(&s, transport.clone());

    s.dom.set_value(&s.email, "me@example.test");
    assert!(!s.dom.submit(&s.form));
    assert_eq!(
        transport.urls(),
        vec![
            "https://x.list-manage.com/subscribe/post-json?u=1&id=2&EMAIL=me%40example.test"
                .to_string()
        ]
    );

    transport.answer(
        0,
        r#"{"result":"success","msg":"Almost finished... We need to confirm your email address."}"#,
    );
    assert!(is_shown(&s.dom, &s.success));
    assert!(s.dom.has_class(&s.success, "fadeInUp"));
    assert_eq!(
        s.dom.inner_html(&s.success_text),
        newsletter::default_strings()["SUCCESS_CONFIRM_EMAIL"]
    );
    assert_eq!(
        s.dom.attribute(&s.success_text, "aria-live").as_deref(),
        Some("polite")
    );
}

#[test]
fn already_subscribed_fills_email_and_list_name() {
    init_logging();
    let s = signup("newsletter");
    let transport = Rc::new(Deferred::default());
    let _signup = attach(&s, transport.clone());

    s.dom.set_value(&s.email, "me@example.test");
    s.dom.submit(&s.form);
    transport.answer(
        0,
        r#"{"result":"error","msg":"0 - me@example.test is already subscribed to list Jobs."}"#,
    );
    assert_eq!(
        s.dom.inner_html(&s.warning_text),
        "me@example.test is already subscribed to list Newsletter."
    );
}

#[test]
fn unrecognized_errors_fall_back_to_try_later() {
    init_logging();
    let s = signup("newsletter");
    let transport = Rc::new(Deferred::default());
    let _signup = attach(&s, transport.clone());

    s.dom.set_value(&s.email, "me@example.test");
    s.dom.submit(&s.form);
    transport.answer(0, r#"{"result":"error","msg":"The list is on fire"}"#);
    assert_eq!(
        s.dom.inner_html(&s.warning_text),
        newsletter::default_strings()["ERR_PLEASE_TRY_LATER"]
    );
}

#[test]
fn only_the_latest_response_updates_the_page() {
    init_logging();
    let s = signup("newsletter");
    let transport = Rc::new(Deferred::default());
    let _signup = attach(&s, transport.clone());

    s.dom.set_value(&s.email, "first@example.test");
    s.dom.submit(&s.form);
    s.dom.set_value(&s.email, "second@example.test");
    s.dom.submit(&s.form);
    assert_eq!(transport.urls().len(), 2);

    transport.answer(1, r#"{"result":"success","msg":"Almost finished..."}"#);
    transport.answer(0, r#"{"result":"error","msg":"too many recent signup requests"}"#);

    assert!(is_shown(&s.dom, &s.success));
    assert_eq!(s.dom.inner_html(&s.warning_text), "");
}

#[test]
fn failed_requests_leave_alerts_hidden() {
    init_logging();
    let s = signup("newsletter");
    let _signup = attach(&s, Rc::new(Offline));

    s.dom.set_value(&s.email, "me@example.test");
    s.dom.submit(&s.form);
    assert!(!is_shown(&s.dom, &s.success));
    assert_eq!(s.dom.inner_html(&s.warning_text), "");
}

#[test]
fn redirect_mode_forwards_the_response() {
    init_logging();
    let s = signup("newsletter");
    let transport = Rc::new(Deferred::default());
    let services = Services {
        transport: transport.clone(),
        ..Services::default()
    };
    let patterns = Patterns::new(&s.dom, PatternsConfig::default(), services);
    let _signup = patterns
        .newsletter("https://example.test/newsletter/confirm")
        .unwrap();

    s.dom.set_value(&s.email, "me@example.test");
    s.dom.submit(&s.form);
    transport.answer(0, r#"{"result":"success","msg":"Almost finished..."}"#);

    assert_eq!(
        s.dom.navigations(),
        vec![
            "https://example.test/newsletter/confirm?result=success&msg=Almost+finished...\
             &response=true&email=me%40example.test"
                .to_string()
        ]
    );
    assert!(!is_shown(&s.dom, &s.success));
}

#[test]
fn landing_page_replays_the_query_string() {
    init_logging();
    let s = signup("newsletter-form");
    s.dom
        .set_location(
            "https://example.test/newsletter/confirm?response=true&result=error\
             &msg=0+-+me%40example.test+is+already+subscribed+to+list+Jobs.\
             &email=me%40example.test",
        )
        .unwrap();
    let patterns = Patterns::new(&s.dom, PatternsConfig::default(), Services::default());
    let signup = patterns.newsletter_form(None).unwrap();

    assert_eq!(s.dom.value(&s.email), "me@example.test");
    assert_eq!(signup.data().get("EMAIL"), Some("me@example.test"));
    assert_eq!(
        s.dom.inner_html(&s.warning_text),
        "me@example.test is already subscribed to list Newsletter."
    );
}

#[test]
fn landing_page_without_a_response_stays_quiet() {
    init_logging();
    let s = signup("newsletter-form");
    let patterns = Patterns::new(&s.dom, PatternsConfig::default(), Services::default());
    let _signup = patterns.newsletter_form(None).unwrap();
    assert!(!is_shown(&s.dom, &s.success));
    assert_eq!(s.dom.inner_html(&s.warning_text), "");
}
