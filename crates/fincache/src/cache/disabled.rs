//! Null fast tier used when the network store is unavailable.

use async_trait::async_trait;

use crate::cache::backend::FastTierBackend;
use crate::error::StoreError;
use crate::stats::BackendSnapshot;

/// Backend selected in degraded mode. Every call returns immediately
/// without I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBackend;

#[async_trait]
impl FastTierBackend for DisabledBackend {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _value: String,
        _ttl_secs: Option<u64>,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> Result<usize, StoreError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn snapshot(&self) -> Result<Option<BackendSnapshot>, StoreError> {
        Ok(None)
    }
}
