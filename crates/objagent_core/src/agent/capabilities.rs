//! Capability declaration generic callers use to adapt to an agent.

use crate::query::expression::Comparator;
use std::collections::BTreeSet;

/// What an agent can do. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    can_set_parent: bool,
    can_query_count: bool,
    supported_comparators: BTreeSet<Comparator>,
}

impl Capabilities {
    pub fn new(
        can_set_parent: bool,
        can_query_count: bool,
        supported_comparators: impl IntoIterator<Item = Comparator>,
    ) -> Self {
        Self {
            can_set_parent,
            can_query_count,
            supported_comparators: supported_comparators.into_iter().collect(),
        }
    }

    pub fn can_set_parent(&self) -> bool {
        self.can_set_parent
    }

    pub fn can_query_count(&self) -> bool {
        self.can_query_count
    }

    pub fn supported_comparators(&self) -> &BTreeSet<Comparator> {
        &self.supported_comparators
    }

    pub fn supports_comparator(&self, comparator: Comparator) -> bool {
        self.supported_comparators.contains(&comparator)
    }
}

#[cfg(test)]
mod tests {
    use super::Capabilities;
    use crate::query::expression::Comparator;

    #[test]
    fn reports_declared_comparators_only() {
        let capabilities = Capabilities::new(false, true, [Comparator::Equals]);
        assert!(capabilities.supports_comparator(Comparator::Equals));
        assert!(!capabilities.supports_comparator(Comparator::In));
        assert!(!capabilities.can_set_parent());
        assert!(capabilities.can_query_count());
    }
}
