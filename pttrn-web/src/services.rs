//! Browser implementations of the pattern services: `fetch`, the analytics
//! globals and `navigator.share`.

use crate::dom;
use crate::error::WebError;
use js_sys::{Array, Function, Promise, Reflect};
use pttrn_core::PatternError;
use pttrn_core::patterns::Services;
use pttrn_core::track::{AnalyticsSink, Destination, Hit};
use pttrn_core::transport::{Completion, ShareData, Sharer, Transport};
use serde::Serialize;
use serde_json::{Value, json};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};

/// Converts `value` into a plain JavaScript object (maps become objects,
/// `None` fields are left out).
///
/// # Errors
/// Returns an error if `value` cannot be represented in JavaScript.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, WebError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| WebError::Js(err.to_string()))
}

/// `GET` requests through `window.fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    fn get_text(&self, url: &str, done: Completion<String>) {
        let url = url.to_string();
        spawn_local(async move {
            let result = dom::fetch_text(&url)
                .await
                .map_err(|err| PatternError::Network(dom::js_error_message(&err)));
            done(result);
        });
    }
}

/// A call on one of the page's analytics globals.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalCall {
    /// Property of `window` holding the receiver or the function.
    pub global: &'static str,
    /// Method called on the global; `None` calls the global itself.
    pub method: Option<&'static str>,
    pub args: Vec<Value>,
}

#[must_use]
pub const fn global_name(destination: Destination) -> &'static str {
    match destination {
        Destination::Webtrends => "Webtrends",
        Destination::Gtag => "gtag",
    }
}

/// How `hit` is delivered: `Webtrends.multiTrack({ argsa })` or
/// `gtag(command, action, params)`.
#[must_use]
pub fn global_call(hit: &Hit) -> GlobalCall {
    match hit {
        Hit::Webtrends { argsa } => GlobalCall {
            global: global_name(Destination::Webtrends),
            method: Some("multiTrack"),
            args: vec![json!({ "argsa": argsa })],
        },
        Hit::Gtag {
            command,
            action,
            params,
        } => GlobalCall {
            global: global_name(Destination::Gtag),
            method: None,
            args: vec![json!(command), json!(action), params.clone()],
        },
    }
}

fn invoke(call: &GlobalCall) -> Result<JsValue, WebError> {
    let window = dom::window().ok_or(WebError::NoWindow)?;
    let global = Reflect::get(&window, &JsValue::from_str(call.global)).map_err(|e| WebError::js(&e))?;
    let (receiver, function) = match call.method {
        Some(method) => {
            let function =
                Reflect::get(&global, &JsValue::from_str(method)).map_err(|e| WebError::js(&e))?;
            (global, function)
        }
        None => (JsValue::UNDEFINED, global),
    };
    let function = function
        .dyn_into::<Function>()
        .map_err(|_| WebError::Js(format!("{} is not callable", call.global)))?;
    let args = Array::new();
    for arg in &call.args {
        args.push(&to_js(arg)?);
    }
    Reflect::apply(&function, &receiver, &args).map_err(|e| WebError::js(&e))
}

/// Sends hits to the `Webtrends` and `gtag` globals when the page defines them.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalAnalytics;

impl AnalyticsSink for GlobalAnalytics {
    fn available(&self, destination: Destination) -> bool {
        dom::window()
            .and_then(|win| Reflect::get(&win, &JsValue::from_str(global_name(destination))).ok())
            .is_some_and(|value| !value.is_undefined() && !value.is_null())
    }

    fn send(&self, hit: &Hit) {
        if let Err(err) = invoke(&global_call(hit)) {
            log::warn!("Analytics call failed: {err}");
        }
    }
}

fn share_function() -> Option<(JsValue, Function)> {
    let navigator: JsValue = dom::window()?.navigator().into();
    let share = Reflect::get(&navigator, &JsValue::from_str("share")).ok()?;
    share.dyn_into::<Function>().ok().map(|f| (navigator, f))
}

/// `navigator.share`, where the browser provides it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigatorShare;

impl Sharer for NavigatorShare {
    fn supported(&self) -> bool {
        share_function().is_some()
    }

    fn share(&self, data: &ShareData, done: Completion<()>) {
        let Some((navigator, share)) = share_function() else {
            done(Err(PatternError::Unsupported("navigator.share")));
            return;
        };
        let promise = to_js(data).and_then(|payload| {
            share
                .call1(&navigator, &payload)
                .and_then(|value| value.dyn_into::<Promise>())
                .map_err(|e| WebError::js(&e))
        });
        match promise {
            Ok(promise) => spawn_local(async move {
                let result = JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|err| PatternError::Platform(dom::js_error_message(&err)));
                done(result);
            }),
            Err(err) => done(Err(PatternError::Platform(err.to_string()))),
        }
    }
}

/// `fetch`, the analytics globals and `navigator.share`.
#[must_use]
pub fn browser_services() -> Services {
    Services {
        transport: Rc::new(FetchTransport),
        analytics: Rc::new(GlobalAnalytics),
        sharer: Rc::new(NavigatorShare),
    }
}
