use crate::error::PatternError;
use crate::toggle::ToggleSettings;
use crate::track::Destination;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ERROR_MESSAGE_PARENT: &str = ".c-question__container";

/// Site-wide settings for [`crate::Patterns`]. Every field is optional in
/// JSON and falls back to the site defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatternsConfig {
    /// Ancestor of a field that receives its validation message.
    pub error_message_parent: Option<String>,
    pub icons_path: String,
    /// Validation messages for `validate` and `validate_and_query` forms.
    pub form_strings: BTreeMap<String, String>,
    /// Overrides merged over the newsletter's default strings.
    pub newsletter_strings: BTreeMap<String, String>,
    pub track_destinations: Vec<Destination>,
    pub window_vh_property: String,
    /// Defaults for `toggle()` calls without explicit settings.
    pub toggle: ToggleSettings,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl PatternsConfig {
    #[must_use]
    pub fn default_config() -> Self {
        Self {
            error_message_parent: Some(ERROR_MESSAGE_PARENT.to_string()),
            icons_path: crate::icons::DEFAULT_PATH.to_string(),
            form_strings: BTreeMap::new(),
            newsletter_strings: BTreeMap::new(),
            track_destinations: Destination::all(),
            window_vh_property: crate::window_vh::PROPERTY.to_string(),
            toggle: ToggleSettings::default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`PatternError::Json`] if the JSON does not describe a config.
    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        Ok(serde_json::from_str(json)?)
    }
}
