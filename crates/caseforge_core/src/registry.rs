//! Marker kind to discoverer lookup table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::discoverer::{CaseVariant, FactDiscoverer, TestCaseDiscoverer, TheoryDiscoverer};
use crate::metadata::MarkerKind;

/// Built once, then only read.
#[derive(Clone, Default)]
pub struct DiscovererRegistry {
    discoverers: HashMap<MarkerKind, Arc<dyn TestCaseDiscoverer>>,
}

impl DiscovererRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `fact`, `theory`, and their cultured variants.
    pub fn builtin() -> Self {
        Self::empty()
            .with(MarkerKind::fact(), Arc::new(FactDiscoverer::new(CaseVariant::Standard)))
            .with(MarkerKind::theory(), Arc::new(TheoryDiscoverer::new(CaseVariant::Standard)))
            .with(
                MarkerKind::new(MarkerKind::CULTURED_FACT),
                Arc::new(FactDiscoverer::new(CaseVariant::Cultured)),
            )
            .with(
                MarkerKind::new(MarkerKind::CULTURED_THEORY),
                Arc::new(TheoryDiscoverer::new(CaseVariant::Cultured)),
            )
    }

    pub fn with(mut self, kind: MarkerKind, discoverer: Arc<dyn TestCaseDiscoverer>) -> Self {
        self.discoverers.insert(kind, discoverer);
        self
    }

    pub fn get(&self, kind: &MarkerKind) -> Option<&Arc<dyn TestCaseDiscoverer>> {
        self.discoverers.get(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&MarkerKind> {
        let mut kinds: Vec<&MarkerKind> = self.discoverers.keys().collect();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds() {
        let registry = DiscovererRegistry::builtin();
        let kinds: Vec<&str> = registry.kinds().into_iter().map(MarkerKind::as_str).collect();
        assert_eq!(kinds, vec!["cultured-fact", "cultured-theory", "fact", "theory"]);
    }

    #[test]
    fn test_empty_registry_knows_nothing() {
        assert!(DiscovererRegistry::empty().get(&MarkerKind::fact()).is_none());
    }
}
