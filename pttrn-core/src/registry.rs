use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Selectors that already have a delegated click listener on `<body>`.
///
/// Clones share one set, so every toggle built from the same composition root
/// sees the others' registrations.
#[derive(Debug, Clone, Default)]
pub struct ToggleRegistry {
    bound: Rc<RefCell<BTreeSet<String>>>,
}

impl ToggleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `selector`; returns `true` only the first time it is seen.
    pub fn claim(&self, selector: &str) -> bool {
        self.bound.borrow_mut().insert(selector.to_string())
    }

    #[must_use]
    pub fn is_bound(&self, selector: &str) -> bool {
        self.bound.borrow().contains(selector)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_are_shared_between_clones() {
        let registry = ToggleRegistry::new();
        let shared = registry.clone();
        assert!(registry.claim("[data-js*=\"toggle\"]"));
        assert!(!shared.claim("[data-js*=\"toggle\"]"));
        assert!(shared.is_bound("[data-js*=\"toggle\"]"));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_bound("[data-js*=\"accordion\"]"));
    }
}
