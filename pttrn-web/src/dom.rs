use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Window};

/// Retrieve the global `window` object, if running in a browser.
#[must_use]
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Convert a JavaScript value into a readable string for error reporting.
#[must_use]
pub fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| err.message().into())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Log an error message to the browser console.
pub fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from(message));
}

/// Perform a fetch request and return the browser `Response`.
///
/// # Errors
/// Returns an error if there is no window, the fetch request fails or the
/// response cannot be converted to `Response`.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn fetch_response(url: &str) -> Result<Response, JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let resp_value = JsFuture::from(win.fetch_with_str(url)).await?;
    resp_value.dyn_into::<Response>()
}

/// Fetch `url` and read the body as text. Non-2xx statuses are errors.
///
/// # Errors
/// Returns an error if the request fails, the status is not a success or the
/// body cannot be read as a string.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let response = fetch_response(url).await?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "{} {} for {url}",
            response.status(),
            response.status_text()
        )));
    }
    let text = JsFuture::from(response.text()?).await?;
    text.as_string()
        .ok_or_else(|| JsValue::from_str("response body is not text"))
}
