use pttrn_core::PatternError;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures of the browser bindings.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("`window` is not available")]
    NoWindow,
    #[error("`document` is not available")]
    NoDocument,
    #[error("JavaScript error: {0}")]
    Js(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl WebError {
    pub(crate) fn js(value: &JsValue) -> Self {
        Self::Js(crate::dom::js_error_message(value))
    }
}

impl From<WebError> for JsValue {
    fn from(err: WebError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
