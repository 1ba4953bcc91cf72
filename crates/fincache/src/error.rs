//! Error types for the fast tier plumbing.
//!
//! None of these reach callers of [`FastTierStore`](crate::FastTierStore):
//! the adapter logs them and returns the operation's neutral value.

use fincache_core::CacheError;

/// Failures of a single fast tier operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing service could not be reached.
    #[error("fast tier unreachable: {reason}")]
    Connectivity { reason: String },

    /// The operation did not finish within its time budget.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// The backing service rejected or failed the command.
    #[error("backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// A glob pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Zero or sub-second TTLs are refused.
    #[error("invalid ttl: {0:?}")]
    InvalidTtl(std::time::Duration),

    /// Value encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CacheError),
}

impl StoreError {
    /// Creates a new connectivity error.
    pub fn connectivity(reason: impl Into<String>) -> Self {
        Self::Connectivity {
            reason: reason.into(),
        }
    }

    /// Returns true if the failure is a network-level problem.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Connectivity { .. } | Self::Timeout { .. } => true,
            Self::Backend(e) => e.is_io_error() || e.is_connection_dropped(),
            _ => false,
        }
    }
}

/// Errors loading the fast tier configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration sources could not be merged.
    #[error("config build error: {0}")]
    Build(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
