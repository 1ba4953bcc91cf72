//! Cache metrics recording.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Registra las metricas de cache.
/// Llamar una vez al inicio, despues de instalar el recorder.
pub fn register_cache_metrics() {
    metrics::describe_counter!("fincache_hits_total", "Total number of fast tier hits");
    metrics::describe_counter!("fincache_misses_total", "Total number of fast tier misses");
    metrics::describe_counter!(
        "fincache_evictions_total",
        "Total number of in-process evictions"
    );
    metrics::describe_counter!(
        "fincache_invalidated_total",
        "Entries removed by scope invalidation, per namespace"
    );
    metrics::describe_counter!(
        "fincache_memo_calls_total",
        "Memoized calls by namespace and outcome"
    );
    metrics::describe_counter!(
        "fincache_failures_total",
        "Fast tier operations degraded to their neutral value"
    );
    metrics::describe_histogram!(
        "fincache_operation_seconds",
        "Time spent on fast tier operations"
    );
}

/// Hit/miss counters kept by an in-process store.
///
/// Son los contadores del propio store, los que lee `snapshot`. Los
/// contadores exportados via `metrics` los emite el adapter para cualquier
/// backend.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registra un cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Retorna el numero de hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Retorna el numero de misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Registra una eviction
    pub fn record_eviction(&self, reason: &'static str) {
        counter!("fincache_evictions_total", "reason" => reason).increment(1);
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Registra la duracion de una operacion
pub fn record_operation_duration(operation: &'static str, duration: Duration) {
    histogram!("fincache_operation_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}

/// Helper para medir tiempo de operaciones async
pub async fn time_operation<T, F>(operation: &'static str, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = Instant::now();
    let result = fut.await;
    record_operation_duration(operation, start.elapsed());
    result
}

/// Registra el resultado de una lectura.
pub fn record_lookup(hit: bool) {
    if hit {
        counter!("fincache_hits_total").increment(1);
    } else {
        counter!("fincache_misses_total").increment(1);
    }
}

/// Cuenta una operacion degradada a su valor neutro.
pub fn record_failure(operation: &'static str) {
    counter!("fincache_failures_total", "operation" => operation).increment(1);
}

pub fn record_invalidated(namespace: &str, count: usize) {
    counter!("fincache_invalidated_total", "namespace" => namespace.to_string())
        .increment(count as u64);
}

pub fn record_memo_call(namespace: &str, outcome: &'static str) {
    counter!(
        "fincache_memo_calls_total",
        "namespace" => namespace.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
