//! Fast tier statistics snapshots.

use serde::Serialize;

/// Raw counters reported by a backend.
///
/// Hits and misses are accumulated by the store itself; the engine never
/// keeps its own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSnapshot {
    pub total_keys: u64,
    /// Human-readable footprint as reported by the store (e.g. `"1.05M"`).
    pub memory_used: String,
    pub hits: u64,
    pub misses: u64,
}

/// Diagnostic snapshot returned by [`FastTierStore::stats`](crate::FastTierStore::stats).
///
/// In disabled mode only `enabled: false` is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_keys: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misses: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_rate: Option<String>,
    /// Set when the store was enabled but could not report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CacheStats {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            total_keys: None,
            memory_used: None,
            hits: None,
            misses: None,
            hit_rate: None,
            error: None,
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            enabled: true,
            error: Some(error.into()),
            ..Self::disabled()
        }
    }

    pub fn from_snapshot(snapshot: BackendSnapshot) -> Self {
        Self {
            enabled: true,
            total_keys: Some(snapshot.total_keys),
            memory_used: Some(snapshot.memory_used),
            hits: Some(snapshot.hits),
            misses: Some(snapshot.misses),
            hit_rate: Some(format_hit_rate(snapshot.hits, snapshot.misses)),
            error: None,
        }
    }
}

/// `hits / (hits + misses) * 100` with one decimal, or `"0%"` without traffic.
///
/// ```
/// use fincache::stats::format_hit_rate;
///
/// assert_eq!(format_hit_rate(90, 10), "90.0%");
/// assert_eq!(format_hit_rate(0, 0), "0%");
/// ```
pub fn format_hit_rate(hits: u64, misses: u64) -> String {
    let total = hits + misses;
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.1}%", hits as f64 / total as f64 * 100.0)
}

/// Formats a byte count the way the network store reports `used_memory_human`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [(&str, f64); 4] = [
        ("T", 1024.0 * 1024.0 * 1024.0 * 1024.0),
        ("G", 1024.0 * 1024.0 * 1024.0),
        ("M", 1024.0 * 1024.0),
        ("K", 1024.0),
    ];

    let value = bytes as f64;
    for (suffix, size) in UNITS {
        if value >= size {
            return format!("{:.2}{suffix}", value / size);
        }
    }
    format!("{bytes}B")
}
