//! The JavaScript-facing `Patterns` class.
//!
//! ```js
//! import init, { Patterns } from "./pttrn_web.js";
//! await init();
//! const patterns = new Patterns({ errorMessageParent: ".c-question__container" });
//! patterns.icons();
//! patterns.accordion();
//! patterns.validate(null, (form) => form.submit());
//! patterns.newsletter("");
//! ```
//!
//! Patterns keep themselves alive through the listeners they bind, so the
//! methods return plain values rather than handles.

use crate::error::WebError;
use crate::services::{browser_services, to_js};
use crate::web_dom::WebDom;
use anyhow::{Context, anyhow};
use js_sys::{Array, Function, Object, Reflect};
use pttrn_core::PatternsConfig;
use pttrn_core::dom::{Event, Handler};
use pttrn_core::patterns::Patterns;
use pttrn_core::toggle::{Hook, Toggle, ToggleConfig, ToggleSettings};
use pttrn_core::track::{Track, TrackData};
use pttrn_core::transport::ShareData;
use pttrn_core::web_share::ShareCallback;
use serde::de::DeserializeOwned;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::Element;

/// Reads an optional JS argument: a JSON string or a plain object.
/// `undefined` and `null` give `None`.
fn decode<T: DeserializeOwned>(value: Option<JsValue>, what: &str) -> Result<Option<T>, WebError> {
    let Some(value) = value.filter(|v| !v.is_undefined() && !v.is_null()) else {
        return Ok(None);
    };
    let decoded: anyhow::Result<T> = match value.as_string() {
        Some(json) => serde_json::from_str(&json).with_context(|| format!("parsing {what} JSON")),
        None => serde_wasm_bindgen::from_value(value)
            .map_err(|err| anyhow!("{err}"))
            .with_context(|| format!("decoding {what} object")),
    };
    decoded
        .map(Some)
        .map_err(|err| WebError::Config(format!("{err:#}")))
}

fn call_logged(function: &Function, arg: &JsValue) {
    if let Err(err) = function.call1(&JsValue::NULL, arg) {
        log::error!("Callback failed: {}", crate::dom::js_error_message(&err));
    }
}

/// `{ element, target, others, focusable }` for a toggle hook.
fn toggle_state(toggle: &Toggle<WebDom>) -> JsValue {
    let Some(state) = toggle.state() else {
        return JsValue::NULL;
    };
    let list = |nodes: &[Element]| nodes.iter().collect::<Array>();
    let object = Object::new();
    let _ = Reflect::set(&object, &"element".into(), &state.element);
    let _ = Reflect::set(&object, &"target".into(), &state.target);
    let _ = Reflect::set(&object, &"others".into(), &list(&state.others));
    let _ = Reflect::set(&object, &"focusable".into(), &list(&state.focusable));
    object.into()
}

fn hook(function: Function) -> Hook<WebDom> {
    Rc::new(move |toggle: &Toggle<WebDom>| call_logged(&function, &toggle_state(toggle)))
}

#[wasm_bindgen(js_name = Patterns)]
pub struct PatternsApi {
    patterns: Patterns<WebDom>,
    track: Option<Track<WebDom>>,
}

impl PatternsApi {
    /// Builds the patterns for the current document with the browser services.
    ///
    /// # Errors
    /// Returns an error outside a browser or when `config` cannot be decoded.
    pub fn create(config: Option<JsValue>) -> Result<Self, WebError> {
        let dom = WebDom::new()?;
        let config = decode::<PatternsConfig>(config, "configuration")?.unwrap_or_default();
        Ok(Self {
            patterns: Patterns::new(&dom, config, browser_services()),
            track: None,
        })
    }

    #[must_use]
    pub const fn patterns(&self) -> &Patterns<WebDom> {
        &self.patterns
    }

    fn tracker(&mut self) -> &Track<WebDom> {
        self.track.get_or_insert_with(|| self.patterns.track())
    }
}

#[wasm_bindgen(js_class = Patterns)]
impl PatternsApi {
    /// `config` is a `PatternsConfig` object or JSON string; omitted fields
    /// keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<JsValue>) -> Result<PatternsApi, JsValue> {
        Ok(Self::create(config)?)
    }

    /// Loads the icon sprite. Returns the requested path.
    pub fn icons(&self, path: Option<String>) -> String {
        self.patterns.icons(path.as_deref()).path().to_string()
    }

    /// Starts a toggle. `settings` is a `ToggleSettings` object; `element`
    /// binds the toggle to one element instead of delegating from `<body>`.
    pub fn toggle(
        &self,
        settings: Option<JsValue>,
        element: Option<Element>,
        before: Option<Function>,
        after: Option<Function>,
    ) -> Result<(), JsValue> {
        let settings = decode::<ToggleSettings>(settings, "toggle settings")?
            .unwrap_or_else(|| self.patterns.config().toggle.clone());
        self.patterns.toggle(Some(ToggleConfig {
            settings,
            element,
            before: before.map(hook),
            after: after.map(hook),
        }));
        Ok(())
    }

    pub fn accordion(&self) {
        self.patterns.accordion();
    }

    pub fn dropdown(&self) {
        self.patterns.dropdown();
    }

    #[wasm_bindgen(js_name = mobileMenu)]
    pub fn mobile_menu(&self) {
        self.patterns.mobile_menu();
    }

    pub fn search(&self) {
        self.patterns.search();
    }

    pub fn copy(&self) {
        self.patterns.copy();
    }

    /// Validates the form matching `selector`. Valid submissions call
    /// `submit(form)`, or submit natively without it. Returns whether a form
    /// was found.
    pub fn validate(&self, selector: Option<String>, submit: Option<Function>) -> bool {
        let submit = submit.map(|function| -> Handler<Element> {
            Rc::new(move |event: &Event<Element>| call_logged(&function, event.target()))
        });
        self.patterns.validate(selector.as_deref(), submit).is_some()
    }

    #[wasm_bindgen(js_name = validateAndQuery)]
    pub fn validate_and_query(&self, selector: Option<String>) -> bool {
        self.patterns.validate_and_query(selector.as_deref()).is_some()
    }

    /// Starts the newsletter signup. A non-empty `endpoint` forwards list
    /// responses to that page instead of showing them inline.
    pub fn newsletter(&self, endpoint: Option<String>) -> bool {
        self.patterns
            .newsletter(endpoint.as_deref().unwrap_or_default())
            .is_some()
    }

    /// Starts the signup on a redirect landing page and shows the response
    /// carried in the query string.
    #[wasm_bindgen(js_name = newsletterForm)]
    pub fn newsletter_form(&self, element: Option<Element>) -> bool {
        self.patterns.newsletter_form(element).is_some()
    }

    /// Binds the click tracking listener.
    pub fn track(&mut self) {
        self.tracker();
    }

    /// Tracks `key` with `data` (an array of records) and returns the data
    /// with event values prefixed by the current path.
    #[wasm_bindgen(js_name = trackEvent)]
    pub fn track_event(&mut self, key: &str, data: Option<JsValue>) -> Result<JsValue, JsValue> {
        let data = decode::<TrackData>(data, "track data")?.unwrap_or_default();
        let tracked = self.tracker().track(key, data);
        Ok(to_js(&tracked)?)
    }

    /// Tracks a single page application view.
    #[wasm_bindgen(js_name = trackView)]
    pub fn track_view(&mut self, app: &str, key: &str, data: Option<JsValue>) -> Result<(), JsValue> {
        let data = decode::<TrackData>(data, "track data")?.unwrap_or_default();
        self.tracker().view(app, key, &data);
        Ok(())
    }

    /// Starts the share buttons. `callback(data)` runs after a successful
    /// share. Returns whether the Web Share API is available.
    #[wasm_bindgen(js_name = webShare)]
    pub fn web_share(&self, callback: Option<Function>) -> bool {
        let callback = callback.map(|function| -> ShareCallback {
            Rc::new(move |data: &ShareData| match to_js(data) {
                Ok(value) => call_logged(&function, &value),
                Err(err) => log::error!("{err}"),
            })
        });
        self.patterns.web_share(callback).supported()
    }

    /// Writes the viewport height property now.
    #[wasm_bindgen(js_name = windowVh)]
    pub fn window_vh(&self) {
        self.patterns.window_vh().set();
    }
}
