//! Fast tier cache layer.
//!
//! [`FastTierStore`] is the single entry point: it encodes values, applies
//! TTLs and turns every backend failure into a neutral result. Below it a
//! [`FastTierBackend`] is selected once at construction: Redis, an
//! in-process Moka cache, or the null backend used in degraded mode.

pub mod backend;
pub mod disabled;
pub mod invalidation;
pub mod memoize;
pub mod memory;
pub mod redis;
pub mod store;

// Re-exports
pub use backend::FastTierBackend;
pub use disabled::DisabledBackend;
pub use invalidation::{InvalidationEngine, InvalidationResult};
pub use memoize::{MemoArgs, Memoized, Memoizer};
pub use memory::MemoryBackend;
pub use redis::RedisBackend;
pub use store::FastTierStore;
