//! Browser bindings for the pttrn pattern utilities.
//!
//! [`WebDom`] implements the core `Dom` trait over `web-sys`, [`services`]
//! backs the network, analytics and share seams with browser APIs, and
//! [`api::PatternsApi`] exposes everything to JavaScript as `Patterns`.
#![forbid(unsafe_code)]
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod api;
pub mod dom;
pub mod error;
pub mod logger;
pub mod services;
pub mod web_dom;

// Re-export commonly used types
pub use api::PatternsApi;
pub use error::WebError;
pub use logger::ConsoleLogger;
pub use services::{FetchTransport, GlobalAnalytics, NavigatorShare, browser_services};
pub use web_dom::WebDom;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    if !ConsoleLogger::init() {
        dom::console_error("pttrn: a logger was already installed");
    }
}
