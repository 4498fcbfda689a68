//! Name → factory lookup for aggregates
//!
//! Names are matched case-insensitively. The registry is built once at
//! startup and shared read-only afterwards.

use crate::pipeline::aggregate::AggregateFactory;
use crate::pipeline::builtins;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of aggregate factories
#[derive(Default, Clone)]
pub struct AggregateRegistry {
    factories: HashMap<String, Arc<dyn AggregateFactory>>,
}

impl AggregateRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in aggregate
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }

    /// Register `factory` under `name`, replacing any previous entry
    pub fn register(&mut self, name: &str, factory: impl AggregateFactory + 'static) {
        self.factories.insert(name.to_lowercase(), Arc::new(factory));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AggregateFactory>> {
        self.factories.get(&name.to_lowercase()).cloned()
    }

    /// Registered names (lowercased), sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for AggregateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = AggregateRegistry::with_builtins();
        for name in ["avg", "sum", "min", "max", "count", "first", "last", "ema", "resample"] {
            assert!(registry.get(name).is_some(), "{} missing", name);
        }
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = AggregateRegistry::with_builtins();
        assert!(registry.get("EMA").is_some());
        assert!(registry.get("ReSample").is_some());
        assert!(registry.get("median").is_none());
    }
}
