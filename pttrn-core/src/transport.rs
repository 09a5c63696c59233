//! Asynchronous services the utilities depend on but cannot perform
//! themselves. `pttrn-web` backs them with `fetch`, `navigator.share` and the
//! analytics globals; tests use recording fakes.

use crate::error::PatternError;
use serde::{Deserialize, Serialize};

/// Completion callback for an asynchronous request.
pub type Completion<T> = Box<dyn FnOnce(Result<T, PatternError>)>;

/// Text-over-HTTP GET.
pub trait Transport {
    /// Requests `url` and eventually calls `done` with the response body.
    /// Non-success statuses complete with [`PatternError::Network`].
    fn get_text(&self, url: &str, done: Completion<String>);
}

/// Payload for `navigator.share`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The Web Share API.
pub trait Sharer {
    fn supported(&self) -> bool;
    fn share(&self, data: &ShareData, done: Completion<()>);
}

/// A transport for environments without networking; every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl Transport for Offline {
    fn get_text(&self, url: &str, done: Completion<String>) {
        done(Err(PatternError::Network(format!("offline: {url}"))));
    }
}

impl Sharer for Offline {
    fn supported(&self) -> bool {
        false
    }

    fn share(&self, _data: &ShareData, done: Completion<()>) {
        done(Err(PatternError::Unsupported("navigator.share")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn offline_transport_fails_every_request() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        Offline.get_text(
            "svg/icons.svg",
            Box::new(move |res| {
                sink.replace(Some(res.map_err(|e| e.to_string())));
            }),
        );
        assert_eq!(
            seen.borrow().clone(),
            Some(Err("Network error: offline: svg/icons.svg".to_string()))
        );
        assert!(!Offline.supported());
    }

    #[test]
    fn share_data_omits_missing_fields() {
        let data: ShareData = serde_json::from_str(r#"{"title":"Jobs","url":"/jobs"}"#).unwrap();
        assert_eq!(data.text, None);
        assert_eq!(
            serde_json::to_string(&data).unwrap(),
            r#"{"title":"Jobs","url":"/jobs"}"#
        );
    }
}
