//! A CSS selector subset: the selectors the patterns and their markup use.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors with `=`, `~=`, `|=`, `^=`, `$=`, `*=`, `:not(<compound>)`,
//! descendant and child combinators, and comma separated lists.

use crate::error::PatternError;
use smallvec::SmallVec;

/// Read access to an element for matching.
pub trait ElementView: Sized {
    fn tag(&self) -> &str;
    fn attr(&self, name: &str) -> Option<&str>;
    fn parent_element(&self) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
}

impl AttrSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let value = self.value.as_str();
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == value,
            AttrOp::Includes => !value.is_empty() && actual.split_whitespace().any(|w| w == value),
            AttrOp::DashMatch => {
                actual == value
                    || actual
                        .strip_prefix(value)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttrOp::Prefix => !value.is_empty() && actual.starts_with(value),
            AttrOp::Suffix => !value.is_empty() && actual.ends_with(value),
            AttrOp::Substring => !value.is_empty() && actual.contains(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: SmallVec<[String; 1]>,
    classes: SmallVec<[String; 2]>,
    attrs: SmallVec<[AttrSelector; 2]>,
    negations: Vec<Compound>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.negations.is_empty()
    }

    fn matches<E: ElementView>(&self, el: &E) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && !el.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.ids.iter().all(|id| el.attr("id") == Some(id.as_str())) {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = el.attr("class").unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        if !self.attrs.iter().all(|a| a.matches(el.attr(&a.name))) {
            return false;
        }
        self.negations.iter().all(|n| !n.matches(el))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    // Left to right; the combinator links a compound to the one before it.
    parts: Vec<(Combinator, Compound)>,
}

impl ComplexSelector {
    fn matches<E: ElementView>(&self, el: &E) -> bool {
        self.matches_at(self.parts.len() - 1, el)
    }

    fn matches_at<E: ElementView>(&self, idx: usize, el: &E) -> bool {
        let (combinator, compound) = &self.parts[idx];
        if !compound.matches(el) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => el
                .parent_element()
                .is_some_and(|parent| self.matches_at(idx - 1, &parent)),
            Combinator::Descendant => {
                let mut ancestor = el.parent_element();
                while let Some(node) = ancestor {
                    if self.matches_at(idx - 1, &node) {
                        return true;
                    }
                    ancestor = node.parent_element();
                }
                false
            }
        }
    }
}

/// A parsed, comma separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector list.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Selector`] when the text uses syntax outside the
    /// supported subset or is malformed.
    pub fn parse(input: &str) -> Result<Self, PatternError> {
        let mut parser = Parser {
            source: input,
            chars: input.chars().collect(),
            pos: 0,
        };
        let mut selectors = Vec::new();
        loop {
            selectors.push(parser.complex()?);
            parser.skip_ws();
            match parser.peek() {
                None => break,
                Some(',') => parser.pos += 1,
                Some(c) => return Err(parser.error(format!("unexpected `{c}`"))),
            }
        }
        Ok(Self { selectors })
    }

    #[must_use]
    pub fn matches<E: ElementView>(&self, el: &E) -> bool {
        self.selectors.iter().any(|s| s.matches(el))
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> PatternError {
        PatternError::selector(self.source, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<String, PatternError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn complex(&mut self) -> Result<ComplexSelector, PatternError> {
        self.skip_ws();
        let mut parts = vec![(Combinator::Descendant, self.compound()?)];
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected `{c}`"))),
            };
            parts.push((combinator, self.compound()?));
        }
        Ok(ComplexSelector { parts })
    }

    fn compound(&mut self) -> Result<Compound, PatternError> {
        let mut compound = Compound::default();
        if self.eat('*') {
            compound.tag = Some("*".to_string());
        } else if self.peek().is_some_and(char::is_alphabetic) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let name = self.ident()?;
                    if !name.eq_ignore_ascii_case("not") || !self.eat('(') {
                        return Err(self.error(format!("unsupported pseudo-class `:{name}`")));
                    }
                    self.skip_ws();
                    let inner = self.compound()?;
                    self.skip_ws();
                    if !self.eat(')') {
                        return Err(self.error("unterminated `:not(`"));
                    }
                    compound.negations.push(inner);
                }
                _ => break,
            }
        }
        if compound.is_empty() {
            return Err(self.error("empty compound selector"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrSelector, PatternError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => AttrOp::Equals,
            Some('~') => AttrOp::Includes,
            Some('|') => AttrOp::DashMatch,
            Some('^') => AttrOp::Prefix,
            Some('$') => AttrOp::Suffix,
            Some('*') => AttrOp::Substring,
            _ => return Err(self.error("unterminated attribute selector")),
        };
        self.pos += 1;
        if op != AttrOp::Equals && !self.eat('=') {
            return Err(self.error("malformed attribute operator"));
        }
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if !self.eat(quote) {
                    return Err(self.error("unterminated string"));
                }
                self.chars[start..self.pos - 1].iter().collect()
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        if !self.eat(']') {
            return Err(self.error("unterminated attribute selector"));
        }
        Ok(AttrSelector { name, op, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Fake {
        tag: &'static str,
        attrs: Vec<(&'static str, &'static str)>,
        parent: Option<Box<Fake>>,
    }

    impl ElementView for Fake {
        fn tag(&self) -> &str {
            self.tag
        }

        fn attr(&self, name: &str) -> Option<&str> {
            self.attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        }

        fn parent_element(&self) -> Option<Self> {
            self.parent.as_deref().cloned()
        }
    }

    fn el(tag: &'static str, attrs: &[(&'static str, &'static str)]) -> Fake {
        Fake {
            tag,
            attrs: attrs.to_vec(),
            parent: None,
        }
    }

    fn check(selector: &str, el: &Fake) -> bool {
        SelectorList::parse(selector).unwrap().matches(el)
    }

    #[test]
    fn data_js_substring_matches_any_token_position() {
        let button = el("button", &[("data-js", "dropdown toggle")]);
        assert!(check(r#"[data-js*="toggle"]"#, &button));
        assert!(check(r#"[data-js*="dropdown"]"#, &button));
        assert!(!check(r#"[data-js*="accordion"]"#, &button));
        assert!(!check(r#"[data-js="toggle"]"#, &button));
    }

    #[test]
    fn compound_and_lists() {
        let link = el(
            "A",
            &[("class", "c-link active"), ("id", "nav"), ("tabindex", "-1")],
        );
        assert!(check("a.active#nav", &link));
        assert!(check("button, a", &link));
        assert!(!check("a.hidden", &link));
        assert!(check("[tabindex]", &link));
        assert!(!check("a:not([tabindex='-1'])", &link));
        assert!(check("*", &link));
    }

    #[test]
    fn combinators_walk_ancestors() {
        let form = el("form", &[("class", "c-question__container")]);
        let mut div = el("div", &[]);
        div.parent = Some(Box::new(form));
        let mut input = el("input", &[("name", "EMAIL")]);
        input.parent = Some(Box::new(div));

        assert!(check(r#".c-question__container input[name="EMAIL"]"#, &input));
        assert!(check("div > input", &input));
        assert!(!check("form > input", &input));
    }

    #[test]
    fn prefix_suffix_and_word_operators() {
        let node = el("div", &[("data-x", "alert-warning"), ("lang", "en-US")]);
        assert!(check("[data-x^=alert]", &node));
        assert!(check("[data-x$=warning]", &node));
        assert!(check("[lang|=en]", &node));
        assert!(!check("[data-x~=alert]", &node));
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        for bad in ["", "[data-js", "a:hover", "a,", "[x*]", "#"] {
            assert!(SelectorList::parse(bad).is_err(), "{bad} should fail");
        }
    }
}
