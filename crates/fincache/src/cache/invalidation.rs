//! Owner-scoped cache invalidation.

use std::sync::Arc;

use fincache_core::{InvalidationScope, NamespaceRegistry};
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::store::FastTierStore;
use crate::metrics::cache::record_invalidated;

/// Resultado de una operación de invalidación.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationResult {
    /// Número de entries invalidadas.
    pub count: usize,
    /// Patrones aplicados.
    pub patterns: Vec<String>,
}

/// Sweeps every registered namespace for one owner.
///
/// Keys must follow `{namespace}:{owner_id}:{discriminators...}` for the
/// sweep to find them. Keys shortened to their hashed form no longer carry
/// the owner id and are left to expire.
///
/// # Examples
///
/// ```no_run
/// # use fincache::{FastTierStore, InvalidationEngine};
/// # #[tokio::main]
/// # async fn main() {
/// # let store = FastTierStore::in_memory(100);
/// let engine = InvalidationEngine::with_default_namespaces(store);
///
/// // El usuario 42 registró una transacción nueva
/// let removed = engine.invalidate_scope("42").await;
/// println!("Invalidated {removed} entries");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InvalidationEngine {
    store: FastTierStore,
    registry: Arc<NamespaceRegistry>,
}

impl InvalidationEngine {
    pub fn new(store: FastTierStore, registry: NamespaceRegistry) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
        }
    }

    /// Engine over [`NamespaceRegistry::finance_defaults`].
    pub fn with_default_namespaces(store: FastTierStore) -> Self {
        Self::new(store, NamespaceRegistry::finance_defaults())
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Deletes the owner's entries in every registered namespace and returns
    /// how many went. Zero when disabled or nothing matches; safe to repeat.
    pub async fn invalidate_scope(&self, owner_id: &str) -> usize {
        self.invalidate(&self.registry.scope(owner_id)).await.count
    }

    /// Deletes every entry covered by `scope`.
    pub async fn invalidate(&self, scope: &InvalidationScope) -> InvalidationResult {
        if !self.store.is_enabled() {
            debug!(owner = %scope.owner_id(), "Fast tier disabled, nothing to invalidate");
            return InvalidationResult::default();
        }

        let mut total_count = 0;
        let mut all_patterns = Vec::with_capacity(scope.namespaces().len());

        for namespace in scope.namespaces() {
            let pattern = namespace.scope_pattern(scope.owner_id());
            let count = self.store.delete_by_pattern(&pattern).await;

            record_invalidated(namespace.as_str(), count);
            total_count += count;
            all_patterns.push(pattern);
        }

        info!(
            owner = %scope.owner_id(),
            namespaces = scope.namespaces().len(),
            count = total_count,
            "Owner cache scope invalidated"
        );

        InvalidationResult {
            count: total_count,
            patterns: all_patterns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincache_core::{CacheValue, Namespace};

    #[tokio::test]
    async fn test_invalidate_scope_counts_per_namespace() {
        let store = FastTierStore::in_memory(100);
        let engine = InvalidationEngine::with_default_namespaces(store.clone());

        for ns in engine.registry().namespaces() {
            store.set(format!("{ns}:7:a"), &CacheValue::from(1), None).await;
            store.set(format!("{ns}:8:a"), &CacheValue::from(1), None).await;
        }

        let result = engine.invalidate(&engine.registry().scope("7")).await;
        assert_eq!(result.count, engine.registry().len());
        assert_eq!(result.patterns[0], "forecast:7:*");
        assert_eq!(engine.invalidate_scope("7").await, 0);
        assert!(store.get("report:8:a").await.is_some());
    }

    #[tokio::test]
    async fn test_unregistered_namespace_survives() {
        let store = FastTierStore::in_memory(100);
        let registry = NamespaceRegistry::new().with(Namespace::new("report").unwrap());
        let engine = InvalidationEngine::new(store.clone(), registry);

        store.set("report:1:x", &CacheValue::Null, None).await;
        store.set("goals:1:x", &CacheValue::Null, None).await;

        assert_eq!(engine.invalidate_scope("1").await, 1);
        assert!(store.get("goals:1:x").await.is_some());
    }

    #[tokio::test]
    async fn test_owner_prefix_does_not_leak() {
        let store = FastTierStore::in_memory(100);
        let engine = InvalidationEngine::with_default_namespaces(store.clone());

        store.set("report:1:x", &CacheValue::Null, None).await;
        store.set("report:12:x", &CacheValue::Null, None).await;

        assert_eq!(engine.invalidate_scope("1").await, 1);
        assert!(store.get("report:12:x").await.is_some());
    }

    #[tokio::test]
    async fn test_disabled_store() {
        let engine = InvalidationEngine::with_default_namespaces(FastTierStore::disabled());
        let result = engine.invalidate(&engine.registry().scope("1")).await;
        assert_eq!(result, InvalidationResult::default());
    }
}
