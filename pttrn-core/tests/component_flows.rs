use pttrn_core::components::{Accordion, Dropdown, MobileMenu, Search, dropdown};
use pttrn_core::dom::{Dom, EventKind};
use pttrn_core::memory::MemoryDom;
use pttrn_core::registry::ToggleRegistry;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn locking_dropdown_locks_and_unlocks_the_page() {
    init_logging();
    let dom = MemoryDom::new();
    let body = dom.body_id();
    let open = dom.element(
        &body,
        "button",
        &[
            ("data-js", "dropdown"),
            ("data-dropdown", "open"),
            (dropdown::LOCK_ATTR, "true"),
            ("aria-controls", "menu"),
            ("aria-expanded", "false"),
        ],
    );
    let menu = dom.element(
        &body,
        "nav",
        &[("id", "menu"), ("class", "hidden"), ("aria-hidden", "true")],
    );
    let close = dom.element(
        &menu,
        "button",
        &[
            ("data-js", "dropdown"),
            ("data-dropdown", "close"),
            ("aria-controls", "menu"),
            ("aria-expanded", "false"),
        ],
    );
    dom.scroll_to(0.0, 420.0);
    let _dropdown = Dropdown::new(&dom, &ToggleRegistry::new());

    dom.click(&open);
    assert!(dom.has_class(&menu, "active"));
    assert!(dom.has_class(&body, dropdown::OVERFLOW_CLASS));
    assert_eq!(dom.scroll_position(), (0.0, 0.0));
    assert_eq!(dom.active_element(), Some(close));
    assert_eq!(dom.attribute(&close, "aria-expanded").as_deref(), Some("true"));

    dom.click(&close);
    assert!(!dom.has_class(&menu, "active"));
    assert!(!dom.has_class(&body, dropdown::OVERFLOW_CLASS));
    assert_eq!(dom.active_element(), Some(open));
    assert_eq!(dom.listener_count(&close, EventKind::Blur), 0);
}

#[test]
fn plain_dropdown_leaves_scrolling_alone() {
    init_logging();
    let dom = MemoryDom::new();
    let body = dom.body_id();
    let trigger = dom.element(
        &body,
        "button",
        &[("data-js", "dropdown"), ("aria-controls", "filters")],
    );
    let panel = dom.element(&body, "div", &[("id", "filters"), ("class", "hidden")]);
    dom.scroll_to(0.0, 300.0);
    let _dropdown = Dropdown::new(&dom, &ToggleRegistry::new());

    dom.click(&trigger);
    assert!(dom.has_class(&panel, "active"));
    assert!(!dom.has_class(&body, dropdown::OVERFLOW_CLASS));
    assert_eq!(dom.scroll_position(), (0.0, 300.0));
}

#[test]
fn nested_dropdown_keeps_the_outer_focus_loop() {
    init_logging();
    let dom = MemoryDom::new();
    let body = dom.body_id();
    let open = dom.element(
        &body,
        "button",
        &[
            ("data-js", "dropdown"),
            ("data-dropdown", "open"),
            (dropdown::LOCK_ATTR, "true"),
            ("aria-controls", "menu"),
        ],
    );
    let menu = dom.element(&body, "nav", &[("id", "menu"), ("class", "hidden")]);
    let first = dom.element(&menu, "a", &[("href", "/about")]);
    let sub_trigger = dom.element(
        &menu,
        "button",
        &[("data-js", "dropdown"), ("aria-controls", "sub")],
    );
    let sub = dom.element(&menu, "ul", &[("id", "sub"), ("class", "hidden")]);
    dom.element(&sub, "a", &[("href", "/about/team")]);
    let last = dom.element(&menu, "a", &[("href", "/contact")]);
    let _dropdown = Dropdown::new(&dom, &ToggleRegistry::new());

    dom.click(&open);
    assert_eq!(dom.listener_count(&last, EventKind::Blur), 1);

    dom.click(&sub_trigger);
    assert!(dom.has_class(&sub, "active"));
    dom.click(&sub_trigger);
    assert!(!dom.has_class(&sub, "active"));

    assert!(dom.has_class(&menu, "active"));
    assert!(dom.has_class(&body, dropdown::OVERFLOW_CLASS));
    assert_eq!(dom.listener_count(&last, EventKind::Blur), 1);
    dom.focus(&last);
    dom.blur(&last);
    assert_eq!(dom.active_element(), Some(first));

    dom.click(&open);
    assert_eq!(dom.listener_count(&last, EventKind::Blur), 0);
}

#[test]
fn mobile_menu_traps_focus_while_open() {
    init_logging();
    let dom = MemoryDom::new();
    let body = dom.body_id();
    let open = dom.element(
        &body,
        "button",
        &[
            ("data-js", "mobile-menu"),
            ("data-js-mobile-menu", "open"),
            ("aria-controls", "drawer"),
        ],
    );
    let drawer = dom.element(&body, "div", &[("id", "drawer"), ("class", "hidden")]);
    let close = dom.element(
        &drawer,
        "button",
        &[
            ("data-js", "mobile-menu"),
            ("data-js-mobile-menu", "close"),
            ("aria-controls", "drawer"),
        ],
    );
    let last = dom.element(&drawer, "a", &[("href", "/contact")]);
    let _menu = MobileMenu::new(&dom, &ToggleRegistry::new());

    dom.click(&open);
    assert!(dom.has_class(&drawer, "active"));
    assert_eq!(dom.active_element(), Some(close));

    dom.focus(&last);
    dom.blur(&last);
    assert_eq!(dom.active_element(), Some(close));

    dom.click(&close);
    assert!(!dom.has_class(&drawer, "active"));
    assert_eq!(dom.active_element(), Some(open));
    assert_eq!(dom.listener_count(&last, EventKind::Blur), 0);
}

#[test]
fn search_focuses_its_input_when_opened() {
    init_logging();
    let dom = MemoryDom::new();
    let body = dom.body_id();
    let trigger = dom.element(
        &body,
        "button",
        &[("data-js", "search"), ("aria-controls", "search-panel")],
    );
    let panel = dom.element(&body, "div", &[("id", "search-panel"), ("class", "hidden")]);
    let input = dom.element(&panel, "input", &[("data-js", "search__input")]);
    let _search = Search::new(&dom, &ToggleRegistry::new());

    dom.click(&trigger);
    assert!(dom.has_class(&panel, "active"));
    assert_eq!(dom.active_element(), Some(input));

    dom.click(&trigger);
    assert!(!dom.has_class(&panel, "active"));
}

#[test]
fn components_share_one_registry() {
    init_logging();
    let dom = MemoryDom::new();
    let registry = ToggleRegistry::new();
    let _accordion = Accordion::new(&dom, &registry);
    let _again = Accordion::new(&dom, &registry);
    let _dropdown = Dropdown::new(&dom, &registry);
    assert_eq!(registry.len(), 2);
    assert_eq!(dom.listener_count(&dom.body_id(), EventKind::Click), 2);
}
