//! Textual wire form for cache values.
//!
//! Values are stored as compact JSON. Encoding is lossless for every value
//! in the [`CacheValue`] union; non-finite floats have no JSON form and are
//! rejected instead of being written as `null`. Values nested deeper than
//! [`MAX_NESTING_DEPTH`](crate::MAX_NESTING_DEPTH) are rejected too, since
//! they could be written but never read back.

use crate::error::{CacheError, Result};
use crate::value::CacheValue;

/// Encodes a value into its stored text form.
///
/// # Example
///
/// ```
/// use fincache_core::{CacheValue, codec};
///
/// let text = codec::encode(&CacheValue::from(vec![1, 2])).unwrap();
/// assert_eq!(text, "[1,2]");
/// ```
pub fn encode(value: &CacheValue) -> Result<String> {
    if let Some(reason) = value.find_unencodable() {
        return Err(CacheError::encoding(reason));
    }

    serde_json::to_string(value).map_err(|e| CacheError::encoding(e.to_string()))
}

/// Decodes stored text back into a value.
pub fn decode(text: &str) -> Result<CacheValue> {
    serde_json::from_str(text).map_err(|e| CacheError::decoding_with_cause("malformed entry", e))
}
