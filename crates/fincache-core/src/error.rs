//! Error types for the fincache core.
//!
//! These errors describe failures of the pure building blocks (value
//! conversion, encoding, key namespaces). They never cross the engine
//! boundary: the store adapter in the `fincache` crate turns every one of
//! them into a neutral return value after logging it.
//!
//! # Example
//!
//! ```
//! use fincache_core::{CacheError, CacheValue, codec};
//!
//! let value = CacheValue::from(f64::NAN);
//! let err = codec::encode(&value).unwrap_err();
//! assert!(err.is_encoding());
//! ```

use thiserror::Error;

/// Main error type for fincache core operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The value holds a member outside the structured-value union.
    #[error("value cannot be encoded: {reason}")]
    Encoding {
        /// Why the value was rejected
        reason: String,
    },

    /// Stored text could not be parsed back into a value.
    #[error("stored value cannot be decoded: {reason}")]
    Decoding {
        /// Description of the parse failure
        reason: String,
        /// Underlying parser error, if any
        #[source]
        cause: Option<serde_json::Error>,
    },

    /// A namespace name is unusable as a key prefix.
    #[error("invalid namespace '{name}': {reason}")]
    InvalidNamespace {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },
}

impl CacheError {
    /// Creates an Encoding error.
    pub fn encoding(reason: impl Into<String>) -> Self {
        Self::Encoding {
            reason: reason.into(),
        }
    }

    /// Creates a Decoding error without a cause.
    pub fn decoding(reason: impl Into<String>) -> Self {
        Self::Decoding {
            reason: reason.into(),
            cause: None,
        }
    }

    /// Creates a Decoding error wrapping a parser error.
    pub fn decoding_with_cause(reason: impl Into<String>, cause: serde_json::Error) -> Self {
        Self::Decoding {
            reason: reason.into(),
            cause: Some(cause),
        }
    }

    /// Creates an InvalidNamespace error.
    pub fn invalid_namespace(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNamespace {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is an encoding error.
    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding { .. })
    }

    /// Returns true if this is a decoding error.
    pub fn is_decoding(&self) -> bool {
        matches!(self, Self::Decoding { .. })
    }

    /// Returns true if this is a namespace validation error.
    pub fn is_invalid_namespace(&self) -> bool {
        matches!(self, Self::InvalidNamespace { .. })
    }
}

/// Type alias for Results with CacheError.
pub type Result<T> = std::result::Result<T, CacheError>;
