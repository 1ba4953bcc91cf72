//! Fincache Core - values, keys and namespaces
//!
//! This crate provides the I/O-free building blocks of the fincache engine:
//!
//! - [`CacheValue`]: the structured-value union every cached artifact fits into
//! - [`codec`]: lossless text encoding of cache values
//! - [`CacheKey`] / [`KeyArgs`]: deterministic, bounded-length key derivation
//! - [`Namespace`] / [`NamespaceRegistry`]: key prefixes and owner-scoped
//!   invalidation patterns

pub mod codec;
pub mod error;
pub mod keys;
pub mod namespace;
pub mod value;

pub use error::{CacheError, Result};
pub use keys::{CacheKey, KEY_DELIMITER, KeyArgs, MAX_KEY_LENGTH};
pub use namespace::{
    DEFAULT_NAMESPACES, InvalidationScope, Namespace, NamespaceRegistry, escape_glob,
};
pub use value::{CacheValue, MAX_NESTING_DEPTH};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
