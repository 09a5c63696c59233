//! Successful-control serialization for forms submitted over script.

use crate::dom::Dom;
use crate::error::PatternError;
use url::Url;

const SKIPPED_TYPES: [&str; 5] = ["file", "reset", "submit", "button", "image"];

/// Ordered name/value pairs, duplicates kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// First value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` rendering.
    #[must_use]
    pub fn to_query(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Collects the named, enabled controls of `form`. Unchecked checkboxes and
/// radios, empty values and button-like inputs are left out.
pub fn serialize<D: Dom>(dom: &D, form: &D::Node) -> FormData {
    let mut data = FormData::new();
    for el in dom.query_selector_all(Some(form), "input, select, textarea") {
        let Some(name) = dom.attribute(&el, "name").filter(|n| !n.is_empty()) else {
            continue;
        };
        if dom.is_disabled(&el) {
            continue;
        }
        let kind = dom.input_type(&el);
        if SKIPPED_TYPES.contains(&kind.as_str()) {
            continue;
        }
        if matches!(kind.as_str(), "checkbox" | "radio") && !dom.is_checked(&el) {
            continue;
        }
        let value = dom.value(&el);
        if value.is_empty() {
            continue;
        }
        data.push(name, value);
    }
    data
}

/// Resolves `action` against `base` and appends `data` to its query string.
///
/// # Errors
///
/// Returns [`PatternError::Url`] when `base` is not absolute or `action`
/// cannot be joined onto it.
pub fn query_url(base: &str, action: &str, data: &FormData) -> Result<String, PatternError> {
    let mut url = Url::parse(base)?.join(action)?;
    if !data.is_empty() {
        url.query_pairs_mut().extend_pairs(data.iter());
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    #[test]
    fn serializes_successful_controls_only() {
        let dom = MemoryDom::new();
        let form = dom.element(&dom.body_id(), "form", &[]);
        let email = dom.element(&form, "input", &[("name", "EMAIL"), ("type", "email")]);
        let on = dom.element(&form, "input", &[("name", "topic"), ("type", "checkbox")]);
        let off = dom.element(&form, "input", &[("name", "topic"), ("type", "checkbox")]);
        let off_field = dom.element(&form, "input", &[("name", "zip"), ("disabled", "")]);
        dom.element(&form, "input", &[("type", "submit"), ("name", "go")]);
        dom.element(&form, "input", &[("type", "text")]);
        dom.element(&form, "input", &[("name", "blank")]);
        dom.set_value(&email, "a@b.co");
        dom.set_value(&on, "food");
        dom.set_value(&off, "housing");
        dom.set_value(&off_field, "10001");
        dom.set_checked(&on, true);

        let data = serialize(&dom, &form);
        assert_eq!(data.len(), 2);
        assert_eq!(data.get("EMAIL"), Some("a@b.co"));
        assert_eq!(data.get("topic"), Some("food"));
        assert_eq!(data.to_query(), "EMAIL=a%40b.co&topic=food");
    }

    #[test]
    fn query_url_appends_to_existing_query() {
        let data: FormData = [("EMAIL", "a b@c.co")].into_iter().collect();
        let url = query_url(
            "https://example.test/newsletter",
            "https://list.example/post?u=1&id=2",
            &data,
        )
        .unwrap();
        assert_eq!(url, "https://list.example/post?u=1&id=2&EMAIL=a+b%40c.co");

        let relative = query_url("https://example.test/a/b", "subscribe", &FormData::new()).unwrap();
        assert_eq!(relative, "https://example.test/a/subscribe");
        assert!(query_url("not a url", "x", &data).is_err());
    }
}
