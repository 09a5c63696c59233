//! The composition root: one entry point per pattern, sharing a document,
//! a toggle registry and the browser services.

use crate::components::{Accordion, Dropdown, MobileMenu, Search};
use crate::config::PatternsConfig;
use crate::copy;
use crate::dom::{Dom, Event, Handler};
use crate::forms::{FormSettings, Forms};
use crate::icons::Icons;
use crate::newsletter::{self, Newsletter};
use crate::registry::ToggleRegistry;
use crate::serialize::{query_url, serialize};
use crate::toggle::{Toggle, ToggleConfig};
use crate::track::{self, AnalyticsSink, Destination, Hit, Track};
use crate::transport::{Offline, ShareData, Sharer, Transport};
use crate::web_share::{self, ShareCallback, WebShare};
use crate::window_vh::WindowVh;
use std::fmt;
use std::rc::Rc;

pub const VALIDATE_SELECTOR: &str = r#"[data-js="validate"]"#;
pub const VALIDATE_AND_QUERY_SELECTOR: &str = r#"[data-js="validate-and-query"]"#;

/// Analytics sink for pages without any analytics globals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalytics;

impl AnalyticsSink for NoAnalytics {
    fn available(&self, _destination: Destination) -> bool {
        false
    }

    fn send(&self, _hit: &Hit) {}
}

/// The asynchronous browser services the patterns call out to.
#[derive(Clone)]
pub struct Services {
    pub transport: Rc<dyn Transport>,
    pub analytics: Rc<dyn AnalyticsSink>,
    pub sharer: Rc<dyn Sharer>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            transport: Rc::new(Offline),
            analytics: Rc::new(NoAnalytics),
            sharer: Rc::new(Offline),
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

pub struct Patterns<D: Dom> {
    dom: D,
    config: PatternsConfig,
    registry: ToggleRegistry,
    services: Services,
    window_vh: WindowVh<D>,
}

impl<D: Dom> fmt::Debug for Patterns<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patterns")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Patterns<D> {
    /// Starts the viewport-height property; every other pattern is opt-in.
    pub fn new(dom: &D, config: PatternsConfig, services: Services) -> Self {
        let window_vh = WindowVh::new(dom, Some(&config.window_vh_property));
        Self {
            dom: dom.clone(),
            config,
            registry: ToggleRegistry::new(),
            services,
            window_vh,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PatternsConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &ToggleRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn window_vh(&self) -> &WindowVh<D> {
        &self.window_vh
    }

    /// Loads the sprite at `path`, or the configured icons path.
    pub fn icons(&self, path: Option<&str>) -> Icons {
        let path = path.unwrap_or(&self.config.icons_path);
        Icons::load(&self.dom, self.services.transport.as_ref(), Some(path))
    }

    /// A toggle with `config`, or with the configured default settings.
    pub fn toggle(&self, config: Option<ToggleConfig<D>>) -> Toggle<D> {
        let config = config.unwrap_or_else(|| ToggleConfig {
            settings: self.config.toggle.clone(),
            ..ToggleConfig::default()
        });
        Toggle::new(&self.dom, &self.registry, config)
    }

    fn form_settings(&self) -> FormSettings {
        let mut settings = FormSettings {
            strings: self.config.form_strings.clone(),
            ..FormSettings::default()
        };
        settings
            .selectors
            .error_message_parent
            .clone_from(&self.config.error_message_parent);
        settings
    }

    /// Validates the first form matching `selector` (default
    /// `[data-js="validate"]`). Valid submissions run `submit`, or submit the
    /// form natively.
    pub fn validate(
        &self,
        selector: Option<&str>,
        submit: Option<Handler<D::Node>>,
    ) -> Option<Forms<D>> {
        let form = self
            .dom
            .query_selector(None, selector.unwrap_or(VALIDATE_SELECTOR))?;
        let forms = Forms::new(&self.dom, form, self.form_settings());
        let submit = submit.unwrap_or_else(|| {
            let dom = self.dom.clone();
            Rc::new(move |event: &Event<D::Node>| dom.submit_form(event.target()))
        });
        forms.on_submit(move |event| submit(event));
        forms.watch();
        Some(forms)
    }

    /// Validates the form matching `selector` (default
    /// `[data-js="validate-and-query"]`) and, when valid, navigates to its
    /// action with the serialized fields as the query string.
    pub fn validate_and_query(&self, selector: Option<&str>) -> Option<Forms<D>> {
        let form = self
            .dom
            .query_selector(None, selector.unwrap_or(VALIDATE_AND_QUERY_SELECTOR))?;
        let forms = Forms::new(&self.dom, form, self.form_settings());
        let dom = self.dom.clone();
        forms.on_submit(move |event| {
            let form = event.target();
            let data = serialize(&dom, form);
            match query_url(&dom.location().href, &dom.form_action(form), &data) {
                Ok(url) => dom.navigate(&url),
                Err(err) => log::error!("Failed to build query URL: {err}"),
            }
        });
        forms.watch();
        Some(forms)
    }

    pub fn accordion(&self) -> Accordion<D> {
        Accordion::new(&self.dom, &self.registry)
    }

    pub fn dropdown(&self) -> Dropdown<D> {
        Dropdown::new(&self.dom, &self.registry)
    }

    pub fn copy(&self) -> copy::Copy<D> {
        copy::Copy::new(&self.dom)
    }

    pub fn track(&self) -> Track<D> {
        Track::new(
            &self.dom,
            Rc::clone(&self.services.analytics),
            track::SELECTOR,
            self.config.track_destinations.clone(),
        )
    }

    fn newsletter_at(&self, element: D::Node) -> Option<Newsletter<D>> {
        Newsletter::new(
            &self.dom,
            element,
            Rc::clone(&self.services.transport),
            &self.config.newsletter_strings,
            self.config.error_message_parent.clone(),
        )
    }

    /// The signup at `[data-js="newsletter"]`. With a non-empty `endpoint`
    /// the list response is forwarded there instead of shown inline.
    pub fn newsletter(&self, endpoint: &str) -> Option<Newsletter<D>> {
        let element = self.dom.query_selector(None, newsletter::SELECTOR)?;
        let signup = self.newsletter_at(element)?;
        if !endpoint.is_empty() {
            signup.redirect_to(endpoint);
        }
        Some(signup)
    }

    /// The signup on a redirect landing page. Shows the response carried in
    /// the current query string, if any.
    pub fn newsletter_form(&self, element: Option<D::Node>) -> Option<Newsletter<D>> {
        let element =
            element.or_else(|| self.dom.query_selector(None, newsletter::FORM_SELECTOR))?;
        let signup = self.newsletter_at(element)?;
        signup.replay_query(&self.dom.location().search);
        Some(signup)
    }

    pub fn mobile_menu(&self) -> MobileMenu<D> {
        MobileMenu::new(&self.dom, &self.registry)
    }

    pub fn search(&self) -> Search<D> {
        Search::new(&self.dom, &self.registry)
    }

    /// Share buttons; without the Web Share API they toggle their fallback
    /// panel instead.
    pub fn web_share(&self, callback: Option<ShareCallback>) -> WebShare<D> {
        let callback = callback.unwrap_or_else(|| {
            Rc::new(|data: &ShareData| log::debug!("shared {data:?}"))
        });
        WebShare::new(
            &self.dom,
            Rc::clone(&self.services.sharer),
            web_share::SELECTOR,
            callback,
            || {
                self.toggle(Some(ToggleConfig::with_selector(web_share::SELECTOR)));
            },
        )
    }
}
