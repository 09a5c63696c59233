//! Mailchimp newsletter signup.
//!
//! The wrapped form is validated with [`Forms`]; valid submissions are sent to
//! the list's `post-json` endpoint through a [`Transport`] and the response is
//! shown in one of the element's alert boxes. Only the most recent submission
//! may update the page: responses that arrive after a newer request was made
//! are dropped.

use crate::dom::{Dom, Event};
use crate::error::PatternError;
use crate::forms::{FormSettings, Forms};
use crate::serialize::{FormData, serialize};
use crate::transport::Transport;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

pub const SELECTOR: &str = r#"[data-js="newsletter"]"#;
pub const FORM_SELECTOR: &str = r#"[data-js="newsletter-form"]"#;
pub const ALERTS: &str = r#"[data-js*="alert"]"#;
pub const WARNING: &str = r#"[data-js="alert-warning"]"#;
pub const SUCCESS: &str = r#"[data-js="alert-success"]"#;
pub const ALERT_TEXT: &str = r#"[data-js-alert="text"]"#;
pub const EMAIL_INPUT: &str = r#"input[name="EMAIL"]"#;

pub const ENDPOINT_MAIN: &str = "/post";
pub const ENDPOINT_JSON: &str = "/post-json";

pub const HIDDEN_CLASS: &str = "hidden";
pub const ANIMATE_CLASSES: [&str; 2] = ["animated", "fadeInUp"];

/// Substrings of Mailchimp messages mapped to the string shown instead.
/// Checked in order; the first hit wins.
pub const STRING_KEYS: [(&str, &str); 5] = [
    ("SUCCESS_CONFIRM_EMAIL", "Almost finished..."),
    ("ERR_PLEASE_ENTER_VALUE", "Please enter a value"),
    ("ERR_TOO_MANY_RECENT", "too many"),
    ("ERR_ALREADY_SUBSCRIBED", "is already subscribed"),
    ("ERR_INVALID_EMAIL", "looks fake or invalid"),
];

/// Placeholder keys, written `{{ KEY }}` in strings.
pub const TEMPLATES: [&str; 2] = ["EMAIL", "LIST_NAME"];

static TEMPLATE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    TEMPLATES
        .iter()
        .filter_map(|key| {
            let pattern = format!("(?i){}", regex::escape(&format!("{{{{ {key} }}}}")));
            Regex::new(&pattern).ok().map(|re| (*key, re))
        })
        .collect()
});

/// The default English strings, shared with the form validator.
#[must_use]
pub fn default_strings() -> BTreeMap<String, String> {
    [
        ("VALID_REQUIRED", "This field is required."),
        ("VALID_EMAIL_REQUIRED", "Email is required."),
        ("VALID_EMAIL_INVALID", "Please enter a valid email."),
        ("VALID_CHECKBOX_BOROUGH", "Please select a borough."),
        (
            "ERR_PLEASE_TRY_LATER",
            "There was an error with your submission. Please try again later.",
        ),
        (
            "SUCCESS_CONFIRM_EMAIL",
            "Almost finished... We need to confirm your email address. To complete \
             the subscription process, please click the link in the email we just sent you.",
        ),
        ("ERR_PLEASE_ENTER_VALUE", "Please enter a value"),
        (
            "ERR_TOO_MANY_RECENT",
            "Recipient \"{{ EMAIL }}\" has too many recent signup requests",
        ),
        (
            "ERR_ALREADY_SUBSCRIBED",
            "{{ EMAIL }} is already subscribed to list {{ LIST_NAME }}.",
        ),
        (
            "ERR_INVALID_EMAIL",
            "This email address looks fake or invalid. Please enter a real email address.",
        ),
        ("LIST_NAME", "Newsletter"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Body of a `post-json` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterResponse {
    pub result: String,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Warning,
}

impl AlertKind {
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Success => SUCCESS,
            Self::Warning => WARNING,
        }
    }
}

/// Rewrites a list's form action into its `post-json` endpoint carrying the
/// form fields.
#[must_use]
pub fn prepare_request(action: &str, data: &FormData) -> String {
    let mut url = action.replacen(
        &format!("{ENDPOINT_MAIN}?"),
        &format!("{ENDPOINT_JSON}?"),
        1,
    );
    for (name, value) in data.iter() {
        let value: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
        url.push('&');
        url.push_str(name);
        url.push('=');
        url.push_str(&value);
    }
    url
}

/// Maps `msg` to a localized string when it contains a known substring and
/// fills in its placeholders from `data`, then `strings`. Returns the text and
/// whether a localized string was used.
#[must_use]
pub fn localize(msg: &str, data: &FormData, strings: &BTreeMap<String, String>) -> (String, bool) {
    let key = STRING_KEYS
        .iter()
        .find(|(_, needle)| msg.contains(needle))
        .map(|(key, _)| *key);
    let mut text = key
        .and_then(|k| strings.get(k))
        .cloned()
        .unwrap_or_else(|| msg.to_string());

    for (key, re) in TEMPLATE_PATTERNS.iter() {
        let value = data
            .get(key)
            .filter(|v| !v.is_empty())
            .or_else(|| strings.get(*key).map(String::as_str))
            .unwrap_or_default();
        text = re.replace_all(&text, NoExpand(value)).into_owned();
    }
    (text, key.is_some())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Inline,
    /// Navigate to the endpoint with the response in the query string.
    Redirect(String),
}

struct NewsletterInner<D: Dom> {
    dom: D,
    element: D::Node,
    form: Forms<D>,
    transport: Rc<dyn Transport>,
    strings: BTreeMap<String, String>,
    data: RefCell<FormData>,
    sequence: Cell<u64>,
    mode: RefCell<Mode>,
}

/// A newsletter signup element. Clones share state.
pub struct Newsletter<D: Dom> {
    inner: Rc<NewsletterInner<D>>,
}

impl<D: Dom> Clone for Newsletter<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom> fmt::Debug for Newsletter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Newsletter")
            .field("element", &self.inner.element)
            .field("sequence", &self.inner.sequence.get())
            .field("mode", &self.inner.mode.borrow())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Newsletter<D> {
    /// Wraps the `<form>` inside `element`. `strings` are merged over
    /// [`default_strings`] and handed to the validator as well. Returns `None`
    /// when `element` holds no form.
    pub fn new(
        dom: &D,
        element: D::Node,
        transport: Rc<dyn Transport>,
        strings: &BTreeMap<String, String>,
        error_message_parent: Option<String>,
    ) -> Option<Self> {
        let Some(form_node) = dom.query_selector(Some(&element), "form") else {
            log::warn!("newsletter element has no form");
            return None;
        };
        let mut merged = default_strings();
        merged.extend(strings.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut settings = FormSettings {
            strings: merged.clone(),
            ..FormSettings::default()
        };
        settings.selectors.error_message_parent = error_message_parent;
        let form = Forms::new(dom, form_node, settings);

        let this = Self {
            inner: Rc::new(NewsletterInner {
                dom: dom.clone(),
                element,
                form,
                transport,
                strings: merged,
                data: RefCell::new(FormData::new()),
                sequence: Cell::new(0),
                mode: RefCell::new(Mode::Inline),
            }),
        };

        let weak = Rc::downgrade(&this.inner);
        this.inner.form.on_submit(move |event: &Event<D::Node>| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.submit(event.target());
            }
        });
        this.inner.form.watch();
        Some(this)
    }

    #[must_use]
    pub fn element(&self) -> &D::Node {
        &self.inner.element
    }

    #[must_use]
    pub fn form(&self) -> &Forms<D> {
        &self.inner.form
    }

    #[must_use]
    pub fn strings(&self) -> &BTreeMap<String, String> {
        &self.inner.strings
    }

    /// The data of the last submission or replayed response.
    #[must_use]
    pub fn data(&self) -> FormData {
        self.inner.data.borrow().clone()
    }

    /// Sends responses to `endpoint` as a page navigation instead of showing
    /// them inline.
    pub fn redirect_to(&self, endpoint: &str) {
        self.inner.mode.replace(Mode::Redirect(endpoint.to_string()));
    }

    /// Serializes `form`, sends it and handles the response if no newer
    /// submission was made in the meantime.
    pub fn submit(&self, form: &D::Node) {
        let dom = &self.inner.dom;
        let data = serialize(dom, form);
        let url = prepare_request(&dom.form_action(form), &data);
        self.inner.data.replace(data);

        let sequence = self.inner.sequence.get() + 1;
        self.inner.sequence.set(sequence);
        log::debug!("newsletter request #{sequence}: {url}");

        let weak: Weak<NewsletterInner<D>> = Rc::downgrade(&self.inner);
        self.inner.transport.get_text(
            &url,
            Box::new(move |result| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inner.sequence.get() != sequence {
                    log::debug!("dropping stale newsletter response #{sequence}");
                    return;
                }
                let this = Self { inner };
                let parsed = result.and_then(|body| {
                    serde_json::from_str::<NewsletterResponse>(&body).map_err(PatternError::from)
                });
                match parsed {
                    Ok(response) => this.respond(&response),
                    Err(err) => log::error!("Newsletter request failed: {err}"),
                }
            }),
        );
    }

    /// Shows (or, in redirect mode, forwards) a list response.
    pub fn respond(&self, response: &NewsletterResponse) {
        let redirect = match &*self.inner.mode.borrow() {
            Mode::Redirect(endpoint) => Some(endpoint.clone()),
            Mode::Inline => None,
        };
        match redirect {
            Some(endpoint) => self.redirect(&endpoint, response),
            None => self.display(response),
        }
    }

    /// Shows a list response in the matching alert.
    pub fn display(&self, response: &NewsletterResponse) {
        match response.result.as_str() {
            "success" => {
                self.reset_alerts();
                self.show(AlertKind::Success, &response.msg);
            }
            "error" => {
                self.reset_alerts();
                self.show(AlertKind::Warning, &response.msg);
            }
            other => log::warn!("unhandled newsletter result `{other}`: {response:?}"),
        }
    }

    fn redirect(&self, endpoint: &str, response: &NewsletterResponse) {
        let dom = &self.inner.dom;
        let email = dom
            .query_selector(Some(&self.inner.element), EMAIL_INPUT)
            .map(|input| dom.value(&input))
            .unwrap_or_default();
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("result", &response.result)
            .append_pair("msg", &response.msg)
            .append_pair("response", "true")
            .append_pair("email", &email)
            .finish();
        dom.navigate(&format!("{endpoint}?{query}"));
    }

    /// Replays a response carried in a page's query string (`?response=true&
    /// result=..&msg=..&email=..`), as written by redirect mode. Returns
    /// whether a response was found.
    pub fn replay_query(&self, search: &str) -> bool {
        let params: BTreeMap<String, String> =
            url::form_urlencoded::parse(search.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect();
        if params.get("response").is_none_or(String::is_empty) {
            return false;
        }
        let dom = &self.inner.dom;
        let email = params.get("email").cloned().unwrap_or_default();
        if let Some(input) = dom.query_selector(Some(&self.inner.element), EMAIL_INPUT) {
            dom.set_value(&input, &email);
        }
        let mut data = FormData::new();
        data.push("EMAIL", email);
        self.inner.data.replace(data);

        let response = NewsletterResponse {
            result: params.get("result").cloned().unwrap_or_default(),
            msg: params.get("msg").cloned().unwrap_or_default(),
        };
        self.display(&response);
        true
    }

    /// Hides every visible alert.
    pub fn reset_alerts(&self) {
        let dom = &self.inner.dom;
        for alert in dom.query_selector_all(Some(&self.inner.element), ALERTS) {
            if dom.has_class(&alert, HIDDEN_CLASS) {
                continue;
            }
            dom.add_class(&alert, HIDDEN_CLASS);
            for class in ANIMATE_CLASSES {
                dom.remove_class(&alert, class);
            }
            dom.set_attribute(&alert, "aria-hidden", "true");
            if let Some(text) = dom.query_selector(Some(&alert), ALERT_TEXT) {
                dom.set_attribute(&text, "aria-live", "off");
            }
        }
    }

    /// Writes the localized `msg` into the alert of `kind` and reveals it.
    pub fn show(&self, kind: AlertKind, msg: &str) {
        let dom = &self.inner.dom;
        let Some(alert) = dom.query_selector(Some(&self.inner.element), kind.selector()) else {
            log::warn!("newsletter alert `{}` not found", kind.selector());
            return;
        };
        let text = dom.query_selector(Some(&alert), ALERT_TEXT);
        let msg = if msg.is_empty() { "no message" } else { msg };
        let (localized, handled) = localize(msg, &self.inner.data.borrow(), &self.inner.strings);

        if let Some(text) = &text {
            if handled {
                dom.set_inner_html(text, &localized);
            } else if kind == AlertKind::Warning {
                let fallback = self
                    .inner
                    .strings
                    .get("ERR_PLEASE_TRY_LATER")
                    .cloned()
                    .unwrap_or_default();
                dom.set_inner_html(text, &fallback);
            }
        }

        dom.toggle_class(&alert, HIDDEN_CLASS);
        for class in ANIMATE_CLASSES {
            dom.toggle_class(&alert, class);
        }
        dom.set_attribute(&alert, "aria-hidden", "false");
        if let Some(text) = &text {
            dom.set_attribute(text, "aria-live", "polite");
        }
    }
}
