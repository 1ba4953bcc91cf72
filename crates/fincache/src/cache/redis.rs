//! Network fast tier backed by Redis.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, InfoDict, RedisResult};
use tracing::{debug, info, warn};

use fincache_core::CacheError;

use crate::cache::backend::FastTierBackend;
use crate::config::FastTierConfig;
use crate::error::StoreError;
use crate::stats::BackendSnapshot;

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 500;

/// Keys removed per `DEL` command during a pattern sweep.
const DELETE_CHUNK: usize = 500;

/// Redis-backed fast tier.
///
/// Holds a single multiplexed connection; cloning it is cheap and every
/// clone pipelines over the same socket, so concurrent callers never wait on
/// a pool. Each command runs under the configured operation timeout. The
/// connection is established once: there is no reconnection loop.
#[derive(Clone)]
pub struct RedisBackend {
    conn: MultiplexedConnection,
    op_timeout: Duration,
}

impl RedisBackend {
    /// Connects and verifies the connection with a `PING`.
    pub async fn connect(config: &FastTierConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.connection_url())?;

        let mut conn = tokio::time::timeout(
            config.connect_timeout(),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| StoreError::Timeout {
            operation: "connect",
            timeout_ms: config.connect_timeout_ms,
        })??;

        let pong: String = tokio::time::timeout(
            config.connect_timeout(),
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| StoreError::Timeout {
            operation: "ping",
            timeout_ms: config.connect_timeout_ms,
        })??;

        if pong != "PONG" {
            return Err(StoreError::connectivity(format!(
                "unexpected PING reply: {pong}"
            )));
        }

        info!(url = %config.redacted_url(), "Connected to fast tier");

        Ok(Self {
            conn,
            op_timeout: config.operation_timeout(),
        })
    }

    async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout {
                operation,
                timeout_ms: self.op_timeout.as_millis() as u64,
            }),
        }
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = self
                .run(
                    "scan",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn),
                )
                .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN puede devolver la misma key mas de una vez
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }
}

/// Runs `delete` over `keys` in chunks of [`DELETE_CHUNK`].
///
/// A failing chunk stops the sweep. When earlier chunks already removed
/// keys, that partial count is returned instead of the error.
async fn delete_in_chunks<'a, F, Fut>(keys: &'a [String], mut delete: F) -> Result<u64, StoreError>
where
    F: FnMut(&'a [String]) -> Fut,
    Fut: Future<Output = Result<u64, StoreError>>,
{
    let mut removed: u64 = 0;
    let mut attempted = 0;

    for chunk in keys.chunks(DELETE_CHUNK) {
        match delete(chunk).await {
            Ok(count) => removed += count,
            Err(e) if removed > 0 => {
                warn!(
                    removed,
                    skipped = keys.len() - attempted,
                    error = %e,
                    "Pattern sweep interrupted"
                );
                break;
            },
            Err(e) => return Err(e),
        }
        attempted += chunk.len();
    }

    Ok(removed)
}

#[async_trait]
impl FastTierBackend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let bytes = self.run("get", conn.get::<_, Option<Vec<u8>>>(key)).await?;

        // Otro escritor pudo dejar bytes que no son UTF-8
        match bytes {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                StoreError::Codec(CacheError::decoding(format!(
                    "stored bytes are not UTF-8: {e}"
                )))
            }),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl_secs: Option<u64>,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        match ttl_secs {
            Some(ttl) => {
                self.run("set", conn.set_ex::<_, _, ()>(key, value, ttl))
                    .await?
            },
            None => self.run("set", conn.set::<_, _, ()>(key, value)).await?,
        }
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed = self.run("delete", conn.del::<_, u64>(key)).await?;
        Ok(removed > 0)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize, StoreError> {
        let keys = self.scan_keys(pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.clone();
        let removed = delete_in_chunks(&keys, |chunk| {
            let mut conn = conn.clone();
            async move {
                self.run("delete_by_pattern", conn.del::<_, u64>(chunk))
                    .await
            }
        })
        .await?;

        debug!(pattern = %pattern, matched = keys.len(), removed, "Pattern sweep finished");
        Ok(removed as usize)
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        self.run::<(), _>("clear", redis::cmd("FLUSHDB").query_async(&mut conn))
            .await?;
        Ok(true)
    }

    async fn snapshot(&self) -> Result<Option<BackendSnapshot>, StoreError> {
        let mut conn = self.conn.clone();
        let total_keys: u64 = self
            .run("stats", redis::cmd("DBSIZE").query_async(&mut conn))
            .await?;
        let info: InfoDict = self
            .run("stats", redis::cmd("INFO").query_async(&mut conn))
            .await?;

        Ok(Some(BackendSnapshot {
            total_keys,
            memory_used: info
                .get::<String>("used_memory_human")
                .unwrap_or_else(|| "0B".to_string()),
            hits: info.get::<u64>("keyspace_hits").unwrap_or(0),
            misses: info.get::<u64>("keyspace_misses").unwrap_or(0),
        }))
    }
}
