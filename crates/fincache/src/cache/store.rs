//! The fast tier store adapter.

use std::sync::Arc;
use std::time::Duration;

use fincache_core::{CacheError, CacheKey, CacheValue, KeyArgs, Namespace, codec};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::cache::backend::FastTierBackend;
use crate::cache::disabled::DisabledBackend;
use crate::cache::memoize::Memoizer;
use crate::cache::memory::MemoryBackend;
use crate::cache::redis::RedisBackend;
use crate::config::{BackendKind, FastTierConfig};
use crate::error::StoreError;
use crate::metrics::cache::{record_failure, record_lookup, time_operation};
use crate::stats::CacheStats;

/// Handle to the fast tier.
///
/// Created once at startup with [`connect`](Self::connect) and passed to
/// every consumer; clones share the same backend. The backend is chosen
/// once: if the network store cannot be reached at construction the handle
/// stays in disabled mode for its whole lifetime.
///
/// No operation ever returns an error. Failures are logged and turned into
/// the operation's neutral value (`None`, `false` or `0`), so callers only
/// ever observe a colder cache.
///
/// # Examples
///
/// ```no_run
/// use fincache::{FastTierConfig, FastTierStore};
/// use fincache_core::CacheValue;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = FastTierStore::connect(&FastTierConfig::default()).await;
///
/// store.set("report:42:2024-03", &CacheValue::from(1520.5), Some(std::time::Duration::from_secs(300))).await;
/// if let Some(report) = store.get("report:42:2024-03").await {
///     println!("cached: {report}");
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct FastTierStore {
    backend: Arc<dyn FastTierBackend>,
}

impl FastTierStore {
    /// Builds the store described by `config`.
    ///
    /// Never fails: an unreachable network store yields disabled mode.
    pub async fn connect(config: &FastTierConfig) -> Self {
        if !config.enabled {
            info!("Fast tier disabled by configuration");
            return Self::disabled();
        }

        match config.backend {
            BackendKind::Memory => {
                info!(
                    max_capacity = config.memory_max_capacity,
                    "Using in-process fast tier"
                );
                Self::in_memory(config.memory_max_capacity)
            },
            BackendKind::Redis => match RedisBackend::connect(config).await {
                Ok(backend) => Self::from_backend(Arc::new(backend)),
                Err(e) => {
                    warn!(
                        url = %config.redacted_url(),
                        error = %e,
                        "Fast tier unreachable, running in disabled mode"
                    );
                    Self::disabled()
                },
            },
        }
    }

    /// A store in degraded mode.
    pub fn disabled() -> Self {
        Self::from_backend(Arc::new(DisabledBackend))
    }

    /// A store backed by an in-process cache.
    pub fn in_memory(max_capacity: u64) -> Self {
        Self::from_backend(Arc::new(MemoryBackend::new(max_capacity)))
    }

    /// Wraps any backend implementation.
    pub fn from_backend(backend: Arc<dyn FastTierBackend>) -> Self {
        Self { backend }
    }

    /// Returns false in disabled mode.
    pub fn is_enabled(&self) -> bool {
        self.backend.is_enabled()
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Reads and decodes a value.
    ///
    /// Returns `None` when the key is missing, expired, unreadable, or holds
    /// text that does not decode. Undecodable entries are deleted so the next
    /// computation can replace them.
    pub async fn get(&self, key: impl AsRef<str>) -> Option<CacheValue> {
        let key = key.as_ref();

        let raw = match time_operation("get", self.backend.get(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                if self.is_enabled() {
                    debug!(key = %key, "cache miss");
                    record_lookup(false);
                }
                return None;
            },
            Err(StoreError::Codec(e)) => {
                self.discard_corrupted(key, &e).await;
                return None;
            },
            Err(e) => {
                self.log_failure("get", key, &e);
                return None;
            },
        };

        match codec::decode(&raw) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                record_lookup(true);
                Some(value)
            },
            Err(e) => {
                self.discard_corrupted(key, &e).await;
                None
            },
        }
    }

    async fn discard_corrupted(&self, key: &str, error: &CacheError) {
        warn!(key = %key, error = %error, "Corrupted cache entry, removing");
        record_lookup(false);
        record_failure("decode");
        if let Err(e) = self.backend.delete(key).await {
            self.log_failure("delete", key, &e);
        }
    }

    /// Encodes and stores a value. `ttl` is truncated to whole seconds.
    ///
    /// Returns false if the value cannot be encoded, the TTL is shorter than
    /// one second, or the backend call fails.
    pub async fn set(&self, key: impl AsRef<str>, value: &CacheValue, ttl: Option<Duration>) -> bool {
        let key = key.as_ref();

        let ttl_secs = match ttl {
            Some(ttl) if ttl.as_secs() == 0 => {
                self.log_failure("set", key, &StoreError::InvalidTtl(ttl));
                return false;
            },
            Some(ttl) => Some(ttl.as_secs()),
            None => None,
        };

        let text = match codec::encode(value) {
            Ok(text) => text,
            Err(e) => {
                self.log_failure("set", key, &StoreError::Codec(e));
                return false;
            },
        };

        match time_operation("set", self.backend.set(key, text, ttl_secs)).await {
            Ok(stored) => stored,
            Err(e) => {
                self.log_failure("set", key, &e);
                false
            },
        }
    }

    /// Removes a key. Returns true only if it existed.
    pub async fn delete(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        match time_operation("delete", self.backend.delete(key)).await {
            Ok(existed) => existed,
            Err(e) => {
                self.log_failure("delete", key, &e);
                false
            },
        }
    }

    /// Removes every key matching a glob pattern and returns the count.
    ///
    /// Not atomic against concurrent writers: a key written while the sweep
    /// runs may survive it.
    pub async fn delete_by_pattern(&self, pattern: &str) -> usize {
        match time_operation("delete_by_pattern", self.backend.delete_by_pattern(pattern)).await {
            Ok(count) => {
                if count > 0 {
                    info!(pattern = %pattern, count, "Cache entries deleted by pattern");
                }
                count
            },
            Err(e) => {
                self.log_failure("delete_by_pattern", pattern, &e);
                0
            },
        }
    }

    /// Removes every entry in the store. For administrative and test use.
    pub async fn clear_all(&self) -> bool {
        match time_operation("clear_all", self.backend.clear()).await {
            Ok(cleared) => {
                if cleared {
                    warn!(backend = self.backend.name(), "Fast tier cleared");
                }
                cleared
            },
            Err(e) => {
                self.log_failure("clear_all", "*", &e);
                false
            },
        }
    }

    /// Diagnostic snapshot of the backing store.
    pub async fn stats(&self) -> CacheStats {
        match self.backend.snapshot().await {
            Ok(Some(snapshot)) => CacheStats::from_snapshot(snapshot),
            Ok(None) => CacheStats::disabled(),
            Err(e) => {
                self.log_failure("stats", "-", &e);
                CacheStats::unavailable(e.to_string())
            },
        }
    }

    /// Typed read through [`CacheValue`].
    ///
    /// An entry that decodes but does not fit `T` is treated like a corrupted
    /// one: it is deleted and `None` is returned.
    pub async fn get_as<T: DeserializeOwned>(&self, key: impl AsRef<str>) -> Option<T> {
        let key = key.as_ref();
        let value = self.get(key).await?;

        match value.into_deserialized() {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached entry has unexpected shape, removing");
                record_failure("decode");
                self.delete(key).await;
                None
            },
        }
    }

    /// Typed write through [`CacheValue`]. Returns false for values outside
    /// the structured-value union.
    pub async fn set_as<T: Serialize + ?Sized>(
        &self,
        key: impl AsRef<str>,
        value: &T,
        ttl: Option<Duration>,
    ) -> bool {
        let key = key.as_ref();
        match CacheValue::from_serializable(value) {
            Ok(value) => self.set(key, &value, ttl).await,
            Err(e) => {
                self.log_failure("set", key, &StoreError::Codec(e));
                false
            },
        }
    }

    /// Returns a memoization factory bound to this store.
    ///
    /// ```no_run
    /// # use fincache::FastTierStore;
    /// # use fincache_core::{KeyArgs, Namespace};
    /// # use std::time::Duration;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let store = FastTierStore::disabled();
    /// let forecast = store
    ///     .memoize(Namespace::new("forecast").unwrap(), Some(Duration::from_secs(3600)))
    ///     .wrap(|args: KeyArgs| async move {
    ///         Ok::<_, std::io::Error>(args.positional().len() as i64)
    ///     });
    ///
    /// let months = forecast.call(KeyArgs::new().arg(42).named("months", 6)).await.unwrap();
    /// # }
    /// ```
    pub fn memoize(&self, namespace: Namespace, ttl: Option<Duration>) -> Memoizer {
        Memoizer::new(self.clone(), namespace, ttl)
    }

    /// Derives the key of `args` in `namespace`. Convenience for callers
    /// that manage entries by hand.
    pub fn key_for(namespace: &Namespace, args: &KeyArgs) -> CacheKey {
        CacheKey::derive(namespace, args)
    }

    fn log_failure(&self, operation: &'static str, target: &str, error: &StoreError) {
        record_failure(operation);
        warn!(
            operation,
            target = %target,
            backend = self.backend.name(),
            error = %error,
            "Fast tier operation failed"
        );
    }
}

impl std::fmt::Debug for FastTierStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastTierStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::stats::BackendSnapshot;

    #[tokio::test]
    async fn test_round_trip() {
        let store = FastTierStore::in_memory(100);
        let value = CacheValue::from(vec![1.5, 2.5]);

        assert!(store.set("analytics:1:spend", &value, None).await);
        assert_eq!(store.get("analytics:1:spend").await, Some(value));
    }

    #[tokio::test]
    async fn test_set_rejects_unencodable() {
        let store = FastTierStore::in_memory(100);

        assert!(!store.set("k", &CacheValue::from(f64::NAN), None).await);
        assert!(store.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_set_rejects_sub_second_ttl() {
        let store = FastTierStore::in_memory(100);

        assert!(!store.set("k", &CacheValue::Null, Some(Duration::ZERO)).await);
        assert!(
            !store
                .set("k", &CacheValue::Null, Some(Duration::from_millis(500)))
                .await
        );
        assert!(store.set("k", &CacheValue::Null, Some(Duration::from_secs(1))).await);
    }

    #[tokio::test]
    async fn test_corrupted_entry_self_heals() {
        let backend = Arc::new(MemoryBackend::new(100));
        backend.set("report:1:x", "{broken".into(), None).await.unwrap();
        let store = FastTierStore::from_backend(backend.clone());

        assert!(store.get("report:1:x").await.is_none());
        assert_eq!(backend.get("report:1:x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
        struct Budget {
            category: String,
            limit: i64,
        }

        let store = FastTierStore::in_memory(100);
        let budget = Budget {
            category: "food".into(),
            limit: 400,
        };

        assert!(store.set_as("budget_progress:3:food", &budget, None).await);
        assert_eq!(store.get_as::<Budget>("budget_progress:3:food").await, Some(budget));

        // Forma inesperada: se trata como entrada corrupta
        assert!(store.get_as::<Vec<String>>("budget_progress:3:food").await.is_none());
        assert!(store.get("budget_progress:3:food").await.is_none());
    }

    /// Reporta como no-texto cualquier entrada presente.
    struct NonTextBackend {
        inner: MemoryBackend,
    }

    #[async_trait]
    impl FastTierBackend for NonTextBackend {
        fn name(&self) -> &str {
            "non-text"
        }

        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            match self.inner.get(key).await? {
                Some(_) => Err(CacheError::decoding("stored bytes are not UTF-8").into()),
                None => Ok(None),
            }
        }

        async fn set(&self, key: &str, value: String, ttl: Option<u64>) -> Result<bool, StoreError> {
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.delete(key).await
        }

        async fn delete_by_pattern(&self, pattern: &str) -> Result<usize, StoreError> {
            self.inner.delete_by_pattern(pattern).await
        }

        async fn clear(&self) -> Result<bool, StoreError> {
            self.inner.clear().await
        }

        async fn snapshot(&self) -> Result<Option<BackendSnapshot>, StoreError> {
            self.inner.snapshot().await
        }
    }

    #[tokio::test]
    async fn test_non_text_entry_self_heals() {
        let backend = Arc::new(NonTextBackend {
            inner: MemoryBackend::new(100),
        });
        backend.inner.set("report:1:bin", "x".into(), None).await.unwrap();
        let store = FastTierStore::from_backend(backend.clone());

        assert!(store.get("report:1:bin").await.is_none());
        assert_eq!(backend.inner.get("report:1:bin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_too_deep_value_is_not_stored() {
        let store = FastTierStore::in_memory(100);
        let deep = (0..=fincache_core::MAX_NESTING_DEPTH)
            .fold(CacheValue::from(1), |inner, _| CacheValue::List(vec![inner]));

        assert!(!store.set("analytics:1:deep", &deep, None).await);
        assert!(store.get("analytics:1:deep").await.is_none());
    }

    struct FailingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FastTierBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Timeout {
                operation: "get",
                timeout_ms: 1,
            })
        }

        async fn set(&self, _: &str, _: String, _: Option<u64>) -> Result<bool, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::connectivity("reset by peer"))
        }

        async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
            Err(StoreError::connectivity("reset by peer"))
        }

        async fn delete_by_pattern(&self, _pattern: &str) -> Result<usize, StoreError> {
            Err(StoreError::connectivity("reset by peer"))
        }

        async fn clear(&self) -> Result<bool, StoreError> {
            Err(StoreError::connectivity("reset by peer"))
        }

        async fn snapshot(&self) -> Result<Option<BackendSnapshot>, StoreError> {
            Err(StoreError::connectivity("reset by peer"))
        }
    }

    #[tokio::test]
    async fn test_backend_failures_degrade_to_neutral_values() {
        let backend = Arc::new(FailingBackend {
            calls: AtomicUsize::new(0),
        });
        let store = FastTierStore::from_backend(backend.clone());

        assert!(store.is_enabled());
        assert!(store.get("k").await.is_none());
        assert!(!store.set("k", &CacheValue::from(1), None).await);
        assert!(!store.delete("k").await);
        assert_eq!(store.delete_by_pattern("k*").await, 0);
        assert!(!store.clear_all().await);

        let stats = store.stats().await;
        assert!(stats.enabled);
        assert!(stats.error.is_some());

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }
}
