//! pttrn pattern utilities
//!
//! Platform-agnostic behaviour for the site's DOM patterns: the toggle engine
//! and the components built on it, form validation, copy-to-clipboard, icon
//! sprites, newsletter signup, analytics tracking, web share and the
//! viewport-height property. Everything is written against the [`Dom`] trait;
//! `pttrn-web` supplies the browser implementation and [`MemoryDom`] an
//! in-memory one.
#![forbid(unsafe_code)]

pub mod components;
pub mod config;
pub mod copy;
pub mod dom;
pub mod error;
pub mod focus;
pub mod forms;
pub mod icons;
pub mod memory;
pub mod newsletter;
pub mod patterns;
pub mod registry;
pub mod selector;
pub mod serialize;
pub mod toggle;
pub mod track;
pub mod transport;
pub mod web_share;
pub mod window_vh;

// Re-export commonly used types
pub use components::{Accordion, Dropdown, MobileMenu, Search};
pub use config::PatternsConfig;
pub use dom::{Dom, Event, EventKind, Handler, ListenerId, Location, TimerId, Validity};
pub use error::PatternError;
pub use focus::FocusLoop;
pub use forms::{FormSettings, Forms};
pub use icons::Icons;
pub use memory::{MemoryDom, NodeId};
pub use newsletter::{Newsletter, NewsletterResponse};
pub use patterns::{NoAnalytics, Patterns, Services};
pub use registry::ToggleRegistry;
pub use selector::SelectorList;
pub use serialize::{FormData, query_url, serialize};
pub use toggle::{AriaState, Toggle, ToggleConfig, ToggleSettings, ToggleState};
pub use track::{AnalyticsSink, Destination, Hit, Track};
pub use transport::{Completion, Offline, ShareData, Sharer, Transport};
pub use web_share::WebShare;
pub use window_vh::WindowVh;
