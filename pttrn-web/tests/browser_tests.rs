#![cfg(target_arch = "wasm32")]

use pttrn_core::PatternsConfig;
use pttrn_core::dom::Dom;
use pttrn_core::patterns::{Patterns, Services};
use pttrn_web::WebDom;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Element, HtmlElement};

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

fn fixture(html: &str) -> (WebDom, Element) {
    let dom = WebDom::new().expect("browser document");
    let body = dom.body().expect("document body");
    let root = dom.create_element("div").expect("create fixture root");
    root.set_inner_html(html);
    dom.append_child(&body, &root);
    (dom, root)
}

fn click(dom: &WebDom, selector: &str) {
    dom.query_selector(None, selector)
        .expect("element exists")
        .dyn_into::<HtmlElement>()
        .expect("html element")
        .click();
}

#[wasm_bindgen_test]
fn toggle_flips_target_and_aria_state() {
    let (dom, root) = fixture(
        r#"<button id="t1" data-js="toggle" aria-controls="p1" aria-expanded="false">Menu</button>
           <div id="p1" class="hidden" aria-hidden="true"><a href="/jobs" tabindex="-1">Jobs</a></div>"#,
    );
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    patterns.toggle(None);

    click(&dom, "#t1");
    let target = dom.element_by_id("p1").expect("target");
    assert!(dom.has_class(&target, "active"));
    assert!(!dom.has_class(&target, "hidden"));
    assert_eq!(dom.attribute(&target, "aria-hidden").as_deref(), Some("false"));
    let trigger = dom.element_by_id("t1").expect("trigger");
    assert_eq!(dom.attribute(&trigger, "aria-expanded").as_deref(), Some("true"));

    click(&dom, "#t1");
    assert!(dom.has_class(&target, "hidden"));
    dom.remove_node(&root);
}

#[wasm_bindgen_test]
fn invalid_required_field_gets_a_message() {
    let (dom, root) = fixture(
        r#"<form data-js="validate" action="/apply">
             <div class="c-question__container">
               <input id="zip" name="zip" required>
             </div>
           </form>"#,
    );
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    let forms = patterns.validate(None, None).expect("form found");

    assert!(!forms.valid());
    let container = dom
        .query_selector(Some(&root), ".c-question__container")
        .expect("container");
    assert_eq!(dom.query_selector_all(Some(&container), ".error-message").len(), 1);
    let input = dom.element_by_id("zip").expect("input");
    assert_eq!(dom.attribute(&input, "aria-invalid").as_deref(), Some("true"));

    forms.reset(&input);
    assert!(dom.query_selector(Some(&container), ".error-message").is_none());
    dom.remove_node(&root);
}

#[wasm_bindgen_test]
fn range_underflow_gets_a_message() {
    let (dom, root) = fixture(
        r#"<form data-js="validate" action="/apply">
             <div class="c-question__container">
               <input id="guests" name="guests" type="number" min="1" value="0" required>
             </div>
           </form>"#,
    );
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    let forms = patterns.validate(None, None).expect("form found");

    assert!(!forms.valid());
    let input = dom.element_by_id("guests").expect("input");
    assert!(!dom.validity(&input).valid());
    assert_eq!(dom.attribute(&input, "aria-invalid").as_deref(), Some("true"));
    dom.remove_node(&root);
}

#[wasm_bindgen_test]
fn clipboard_api_is_preferred_when_present() {
    let dom = WebDom::new().expect("browser document");
    let navigator = web_sys::window().expect("window").navigator();
    let write_text = js_sys::Reflect::get(&navigator, &"clipboard".into())
        .and_then(|clipboard| js_sys::Reflect::get(&clipboard, &"writeText".into()))
        .map(|f| f.is_function())
        .unwrap_or(false);
    if write_text {
        assert!(dom.write_clipboard("pttrn"));
    }
}

#[wasm_bindgen_test]
fn window_vh_writes_the_inner_height() {
    let dom = WebDom::new().expect("browser document");
    let patterns = Patterns::new(&dom, PatternsConfig::default(), Services::default());
    patterns.window_vh().set();
    let root = dom
        .document_element()
        .expect("document element")
        .dyn_into::<HtmlElement>()
        .expect("html element");
    let value = root.style().get_property_value("--100vh").expect("style");
    assert!(value.ends_with("px"));
}

#[wasm_bindgen_test]
fn listeners_are_removed_from_the_table() {
    let (dom, root) = fixture(r#"<button id="b1">b</button>"#);
    let button = dom.element_by_id("b1").expect("button");
    let before = dom.listener_count();
    let id = dom.add_listener(
        &button,
        pttrn_core::EventKind::Click,
        std::rc::Rc::new(|_: &pttrn_core::Event<Element>| {}),
    );
    assert_eq!(dom.listener_count(), before + 1);
    dom.remove_listener(&button, id);
    assert_eq!(dom.listener_count(), before);
    dom.remove_node(&root);
}
