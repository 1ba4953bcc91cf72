//! In-process fast tier using Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use glob::Pattern;
use moka::Expiry;
use moka::future::Cache;
use moka::notification::RemovalCause;

use crate::cache::backend::FastTierBackend;
use crate::error::StoreError;
use crate::metrics::CacheMetrics;
use crate::stats::{BackendSnapshot, format_bytes};

#[derive(Debug, Clone)]
struct StoredEntry {
    text: Arc<str>,
    ttl: Option<Duration>,
}

/// Per-entry TTL. Reads never extend it; an overwrite starts a new one.
struct EntryExpiry;

impl Expiry<String, StoredEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Fast tier living inside the process.
///
/// Useful for single-instance deployments and for tests. Entries are not
/// shared between processes. Hit/miss counters are kept here, the same way
/// the network store keeps its own.
///
/// # Examples
///
/// ```no_run
/// use fincache::cache::MemoryBackend;
/// use fincache::cache::backend::FastTierBackend;
///
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new(1_000);
/// backend.set("report:1:2024", "[1,2]".to_string(), Some(60)).await.unwrap();
/// assert!(backend.get("report:1:2024").await.unwrap().is_some());
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Cache<String, StoredEntry>,
    metrics: CacheMetrics,
}

impl MemoryBackend {
    /// Crea un nuevo backend con la capacidad maxima dada.
    pub fn new(max_capacity: u64) -> Self {
        let metrics = CacheMetrics::new();

        // Configurar listener para evictions
        let eviction_metrics = metrics.clone();
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .eviction_listener(move |_key, _value, cause| {
                let reason = match cause {
                    RemovalCause::Expired => "ttl",
                    RemovalCause::Size => "capacity",
                    RemovalCause::Explicit => "manual",
                    RemovalCause::Replaced => "replaced",
                };
                eviction_metrics.record_eviction(reason);
            })
            .build();

        Self { inner, metrics }
    }

    /// Retorna las metricas para acceso externo.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn matching_keys(&self, pattern: &Pattern) -> Vec<String> {
        self.inner
            .iter()
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, _)| key.as_ref().clone())
            .collect()
    }
}

#[async_trait]
impl FastTierBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.inner.get(key).await {
            Some(entry) => {
                self.metrics.record_hit();
                Ok(Some(entry.text.to_string()))
            },
            None => {
                self.metrics.record_miss();
                Ok(None)
            },
        }
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl_secs: Option<u64>,
    ) -> Result<bool, StoreError> {
        let entry = StoredEntry {
            text: Arc::from(value),
            ttl: ttl_secs.map(Duration::from_secs),
        };
        self.inner.insert(key.to_string(), entry).await;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.inner.remove(key).await.is_some())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize, StoreError> {
        let compiled = Pattern::new(pattern).map_err(|e| StoreError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        // Recolectar primero; una key escrita despues puede sobrevivir
        let mut removed = 0;
        for key in self.matching_keys(&compiled) {
            if self.inner.remove(&key).await.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
        Ok(true)
    }

    async fn snapshot(&self) -> Result<Option<BackendSnapshot>, StoreError> {
        self.inner.run_pending_tasks().await;

        let (total_keys, bytes) = self
            .inner
            .iter()
            .fold((0u64, 0u64), |(count, bytes), (key, entry)| {
                (count + 1, bytes + (key.len() + entry.text.len()) as u64)
            });

        Ok(Some(BackendSnapshot {
            total_keys,
            memory_used: format_bytes(bytes),
            hits: self.metrics.hits(),
            misses: self.metrics.misses(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let backend = MemoryBackend::new(100);

        assert!(backend.set("forecast:1:6", "42".into(), None).await.unwrap());
        assert_eq!(
            backend.get("forecast:1:6").await.unwrap().as_deref(),
            Some("42")
        );
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let backend = MemoryBackend::new(100);
        assert_eq!(backend.get("nonexistent").await.unwrap(), None);
        assert_eq!(backend.metrics().misses(), 1);
    }

    #[tokio::test]
    async fn test_ttl_expires_entry() {
        let backend = MemoryBackend::new(100);
        backend.set("short", "1".into(), Some(1)).await.unwrap();
        backend.set("long", "1".into(), None).await.unwrap();

        assert!(backend.get("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert!(backend.get("short").await.unwrap().is_none());
        assert!(backend.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_drops_previous_ttl() {
        let backend = MemoryBackend::new(100);
        backend.set("k", "1".into(), Some(1)).await.unwrap();
        backend.set("k", "2".into(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let backend = MemoryBackend::new(100);
        backend.set("k", "1".into(), None).await.unwrap();

        assert!(backend.delete("k").await.unwrap());
        assert!(!backend.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pattern() {
        let backend = MemoryBackend::new(100);
        for key in ["report:1:a", "report:1:b", "report:2:a", "forecast:1:a"] {
            backend.set(key, "0".into(), None).await.unwrap();
        }

        assert_eq!(backend.delete_by_pattern("report:1:*").await.unwrap(), 2);
        assert_eq!(backend.delete_by_pattern("report:1:*").await.unwrap(), 0);
        assert!(backend.get("report:2:a").await.unwrap().is_some());
        assert!(backend.get("forecast:1:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_escaped_pattern_is_literal() {
        let backend = MemoryBackend::new(100);
        backend.set("report:*:a", "0".into(), None).await.unwrap();
        backend.set("report:7:a", "0".into(), None).await.unwrap();

        assert_eq!(backend.delete_by_pattern("report:[*]:*").await.unwrap(), 1);
        assert!(backend.get("report:7:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let backend = MemoryBackend::new(100);
        let err = backend.delete_by_pattern("report:[").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_snapshot_counts() {
        let backend = MemoryBackend::new(100);
        backend.set("a", "12345".into(), None).await.unwrap();
        backend.set("b", "1".into(), None).await.unwrap();
        backend.get("a").await.unwrap();
        backend.get("zzz").await.unwrap();

        let snapshot = backend.snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.total_keys, 2);
        assert_eq!(snapshot.memory_used, "8B");
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let backend = MemoryBackend::new(100);
        for i in 0..10 {
            backend.set(&format!("k{i}"), "v".into(), None).await.unwrap();
        }

        assert!(backend.clear().await.unwrap());

        let snapshot = backend.snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.total_keys, 0);
        assert!(backend.get("k3").await.unwrap().is_none());
    }
}
