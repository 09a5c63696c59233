//! Analytics bus for Webtrends and gtag.
//!
//! Clicks on `[data-js*="track"]` send `data-track-key` with the JSON array
//! in `data-track-data` to every configured destination.

use crate::dom::{Dom, delegate_click};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::rc::Rc;

pub const SELECTOR: &str = r#"[data-js*="track"]"#;
/// The event key; its value becomes Webtrends' `DCS.dcsuri`.
pub const KEY: &str = "event";

/// One tracked record, as written in `data-track-data`.
pub type TrackData = Vec<Map<String, Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Webtrends,
    Gtag,
}

impl Destination {
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![Self::Webtrends, Self::Gtag]
    }
}

/// A call on one of the analytics globals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "destination", rename_all = "lowercase")]
pub enum Hit {
    /// `Webtrends.multiTrack({ argsa })`.
    Webtrends { argsa: Vec<Value> },
    /// `gtag(command, action, params)`.
    Gtag {
        command: String,
        action: String,
        params: Value,
    },
}

/// The analytics globals present on the page.
pub trait AnalyticsSink {
    fn available(&self, destination: Destination) -> bool;
    fn send(&self, hit: &Hit);
}

/// Builds the `multiTrack` argument list for `key` and `data`. The first
/// record's event becomes `DCS.dcsuri`; otherwise the records are appended
/// as they are. An `action` key is renamed to `DCS.dcsuri` and the uri value
/// is prefixed with `pathname` unless it already starts with it.
#[must_use]
pub fn webtrends_args(key: &str, data: &[Map<String, Value>], pathname: &str) -> Vec<Value> {
    let mut records = vec![Map::from_iter([("WT.ti".to_string(), json!(key))])];
    match data.first().and_then(|first| first.get(KEY)) {
        Some(event) => {
            records.push(Map::from_iter([("DCS.dcsuri".to_string(), event.clone())]));
        }
        None => records.extend(data.iter().cloned()),
    }

    let mut argsa: Vec<Value> = records
        .into_iter()
        .flat_map(|record| record.into_iter().flat_map(|(k, v)| [Value::String(k), v]))
        .collect();

    if let Some(action) = argsa.iter().position(|v| v == "action") {
        argsa[action] = json!("DCS.dcsuri");
    }
    if let Some(uri) = argsa.iter().position(|v| v == "DCS.dcsuri") {
        if let Some(Value::String(value)) = argsa.get_mut(uri + 1) {
            if !value.starts_with(pathname) {
                *value = format!("{pathname}{value}");
            }
        }
    }
    argsa
}

/// The gtag event for the first record carrying an event key.
#[must_use]
pub fn gtag_event(key: &str, data: &[Map<String, Value>]) -> Option<Hit> {
    let uri = data.iter().find_map(|record| record.get(KEY))?;
    Some(Hit::Gtag {
        command: KEY.to_string(),
        action: uri.as_str().map_or_else(|| uri.to_string(), str::to_string),
        params: json!({ "event_category": key }),
    })
}

#[must_use]
pub fn gtag_view(app: &str, key: &str) -> Hit {
    Hit::Gtag {
        command: "event".to_string(),
        action: "screen_view".to_string(),
        params: json!({ "app_name": app, "screen_name": key }),
    }
}

struct TrackInner<D: Dom> {
    dom: D,
    sink: Rc<dyn AnalyticsSink>,
    destinations: Vec<Destination>,
}

pub struct Track<D: Dom> {
    inner: Rc<TrackInner<D>>,
}

impl<D: Dom> Clone for Track<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom> fmt::Debug for Track<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("destinations", &self.inner.destinations)
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Track<D> {
    /// Binds the delegated click listener for `selector`.
    pub fn new(
        dom: &D,
        sink: Rc<dyn AnalyticsSink>,
        selector: &str,
        destinations: Vec<Destination>,
    ) -> Self {
        let this = Self {
            inner: Rc::new(TrackInner {
                dom: dom.clone(),
                sink,
                destinations,
            }),
        };
        let handler = this.clone();
        delegate_click(dom, selector, move |event| handler.click(event.target()));
        this
    }

    fn click(&self, el: &D::Node) {
        let dom = &self.inner.dom;
        let key = dom.attribute(el, "data-track-key").unwrap_or_default();
        let raw = dom.attribute(el, "data-track-data").unwrap_or_default();
        match serde_json::from_str::<TrackData>(&raw) {
            Ok(data) => {
                self.track(&key, data);
            }
            Err(err) => log::warn!("ignoring track click with invalid data-track-data: {err}"),
        }
    }

    fn enabled(&self, destination: Destination) -> bool {
        self.inner.destinations.contains(&destination) && self.inner.sink.available(destination)
    }

    /// Prefixes event values with the current pathname, sends the hits and
    /// returns the rewritten data.
    pub fn track(&self, key: &str, mut data: TrackData) -> TrackData {
        let pathname = self.inner.dom.location().pathname;
        for record in &mut data {
            if let Some(event) = record.get_mut(KEY) {
                let value = event.as_str().map_or_else(|| event.to_string(), str::to_string);
                *event = json!(format!("{pathname}/{value}"));
            }
        }

        let hits = [self.webtrends(key, &data), self.gtag(key, &data)];
        log::debug!("Track: {hits:?}");
        data
    }

    /// Tracks a single page application view.
    pub fn view(&self, app: &str, key: &str, data: &[Map<String, Value>]) {
        let webtrends = self.webtrends(key, data);
        let gtag = self.enabled(Destination::Gtag).then(|| {
            let hit = gtag_view(app, key);
            self.inner.sink.send(&hit);
            hit
        });
        let hits = [webtrends, gtag];
        log::debug!("Track: {hits:?}");
    }

    /// Sends `key`/`data` to Webtrends; `None` when it is not available.
    pub fn webtrends(&self, key: &str, data: &[Map<String, Value>]) -> Option<Hit> {
        if !self.enabled(Destination::Webtrends) {
            return None;
        }
        let pathname = self.inner.dom.location().pathname;
        let hit = Hit::Webtrends {
            argsa: webtrends_args(key, data, &pathname),
        };
        self.inner.sink.send(&hit);
        Some(hit)
    }

    /// Sends the click event to gtag; `None` when gtag is not available or no
    /// record carries an event.
    pub fn gtag(&self, key: &str, data: &[Map<String, Value>]) -> Option<Hit> {
        if !self.enabled(Destination::Gtag) {
            return None;
        }
        let hit = gtag_event(key, data)?;
        self.inner.sink.send(&hit);
        Some(hit)
    }
}
