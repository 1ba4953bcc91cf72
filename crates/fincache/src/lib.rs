//! Fincache - tiered cache and invalidation engine
//!
//! The fast tier sits in front of expensive derived computations (forecasts,
//! reports, analytics summaries) and re-serves their results until the
//! owner's data changes.
//!
//! - [`FastTierStore`]: get/set/delete/pattern delete over Redis or Moka,
//!   degrading to neutral values when the store is unreachable
//! - [`InvalidationEngine`]: sweeps every registered namespace for one owner
//! - [`Memoizer`]: caches the results of async computations by argument
//! - [`CacheStats`]: diagnostic snapshot with the derived hit rate

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod stats;

pub use cache::{
    FastTierBackend, FastTierStore, InvalidationEngine, InvalidationResult, MemoArgs, Memoized,
    Memoizer,
};
pub use config::{BackendKind, FastTierConfig};
pub use error::{ConfigError, StoreError};
pub use stats::CacheStats;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }
}
