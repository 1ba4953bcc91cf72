//! Metrics module for the fincache engine.
//!
//! Metrics go through the `metrics` facade; the host process installs the
//! recorder (Prometheus, StatsD, ...).

pub mod cache;

pub use cache::{CacheMetrics, register_cache_metrics};
