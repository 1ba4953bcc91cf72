//! Fast tier backend trait definition.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::stats::BackendSnapshot;

/// Raw text operations of a fast tier.
///
/// Implementations deal only in encoded text; encoding, self-healing and
/// the conversion of errors into neutral values happen in
/// [`FastTierStore`](crate::FastTierStore).
///
/// # Implementors
///
/// - `RedisBackend` - network key-value service
/// - `MemoryBackend` - in-process tier backed by Moka
/// - `DisabledBackend` - null implementation used in degraded mode
#[async_trait]
pub trait FastTierBackend: Send + Sync {
    /// Returns the name of this backend, for logging.
    fn name(&self) -> &str;

    /// Returns false for the null implementation.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Fetches the stored text, `None` if missing or expired.
    ///
    /// Stored bytes that are not text are reported as
    /// [`StoreError::Codec`] so the adapter can discard the entry.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores text, expiring after `ttl_secs` when given. Returns false
    /// when the backend does not store anything.
    async fn set(
        &self,
        key: &str,
        value: String,
        ttl_secs: Option<u64>,
    ) -> Result<bool, StoreError>;

    /// Removes a key. Returns true if it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Removes every key matching a glob pattern, returning how many went.
    ///
    /// Enumeration and deletion are separate steps: a key written in
    /// between may survive the sweep.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize, StoreError>;

    /// Removes every entry. Returns false when there is nothing to clear.
    async fn clear(&self) -> Result<bool, StoreError>;

    /// Reads the store's own counters, `None` when the backend keeps none.
    async fn snapshot(&self) -> Result<Option<BackendSnapshot>, StoreError>;
}
