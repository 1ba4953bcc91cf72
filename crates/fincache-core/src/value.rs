use std::fmt;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Deepest list/map nesting that survives a round trip through the codec.
///
/// The JSON decoder refuses a 128th nested container.
pub const MAX_NESTING_DEPTH: usize = 127;

/// A structured value that can be stored in the fast tier.
///
/// This is the closed union every cached artifact must fit into: null,
/// boolean, number, string, ordered list and string-keyed map. Anything the
/// engine caches goes through this type, so values that cannot be expressed
/// here are rejected at conversion time instead of deep inside the encoder.
///
/// Maps use `IndexMap` so the encoded text keeps insertion order; equality
/// between maps ignores order.
///
/// # Example
///
/// ```
/// use fincache_core::CacheValue;
///
/// let val: CacheValue = "hello".into();
/// assert_eq!(val.as_str(), Some("hello"));
///
/// let list: CacheValue = vec![1, 2, 3].into();
/// assert_eq!(list.as_list().map(|l| l.len()), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (signed 64-bit)
    Integer(i64),
    /// Floating point value (wrapped in OrderedFloat for Eq support)
    Float(OrderedFloat<f64>),
    /// String value
    String(String),
    /// Ordered list of values
    List(Vec<CacheValue>),
    /// Map of string keys to values
    Map(IndexMap<String, CacheValue>),
}

impl CacheValue {
    /// Converts any serializable domain type into a cache value.
    ///
    /// Fails with [`CacheError::Encoding`] when the type has members outside
    /// the union, such as maps keyed by non-strings or unsigned integers that
    /// do not fit in an `i64`.
    ///
    /// ```
    /// use fincache_core::CacheValue;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Forecast { month: u8, balance: f64 }
    ///
    /// let value = CacheValue::from_serializable(&Forecast { month: 3, balance: 1250.5 }).unwrap();
    /// assert_eq!(value.get("month").and_then(|m| m.as_i64()), Some(3));
    /// ```
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| CacheError::encoding(format!("unsupported member: {e}")))?;
        Self::try_from(json)
    }

    /// Converts this value back into a domain type.
    pub fn into_deserialized<T: DeserializeOwned>(self) -> Result<T> {
        let json = serde_json::to_value(&self)
            .map_err(|e| CacheError::decoding_with_cause("value is not representable", e))?;
        serde_json::from_value(json)
            .map_err(|e| CacheError::decoding_with_cause("value does not match target type", e))
    }

    /// Returns true if the value is Null.
    pub fn is_null(&self) -> bool {
        matches!(self, CacheValue::Null)
    }

    /// Returns the value as a bool if it matches.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CacheValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an i64 if it matches.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CacheValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as an f64 if it matches (Integer or Float).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CacheValue::Float(f) => Some(f.into_inner()),
            CacheValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the value as a str if it matches.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CacheValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a list slice if it matches.
    pub fn as_list(&self) -> Option<&[CacheValue]> {
        match self {
            CacheValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the value as a map if it matches.
    pub fn as_map(&self) -> Option<&IndexMap<String, CacheValue>> {
        match self {
            CacheValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a member of a map value.
    pub fn get(&self, key: &str) -> Option<&CacheValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Walks the value looking for the first member that cannot be encoded.
    pub(crate) fn find_unencodable(&self) -> Option<String> {
        self.find_unencodable_at(0)
    }

    fn find_unencodable_at(&self, depth: usize) -> Option<String> {
        match self {
            CacheValue::Float(f) if !f.is_finite() => {
                Some(format!("float {} is not finite", f.into_inner()))
            },
            CacheValue::List(_) | CacheValue::Map(_) if depth >= MAX_NESTING_DEPTH => Some(format!(
                "nesting deeper than {MAX_NESTING_DEPTH} levels"
            )),
            CacheValue::List(items) => items
                .iter()
                .find_map(|item| item.find_unencodable_at(depth + 1)),
            CacheValue::Map(map) => map.iter().find_map(|(key, value)| {
                value
                    .find_unencodable_at(depth + 1)
                    .map(|reason| format!("{key}: {reason}"))
            }),
            _ => None,
        }
    }
}

impl TryFrom<serde_json::Value> for CacheValue {
    type Error = CacheError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        Ok(match json {
            Value::Null => CacheValue::Null,
            Value::Bool(b) => CacheValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CacheValue::Integer(i)
                } else if n.is_u64() {
                    return Err(CacheError::encoding(format!(
                        "integer {n} does not fit in a signed 64-bit value"
                    )));
                } else {
                    let f = n
                        .as_f64()
                        .ok_or_else(|| CacheError::encoding(format!("number {n} is not an f64")))?;
                    CacheValue::Float(OrderedFloat(f))
                }
            },
            Value::String(s) => CacheValue::String(s),
            Value::Array(items) => CacheValue::List(
                items
                    .into_iter()
                    .map(CacheValue::try_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(map) => CacheValue::Map(
                map.into_iter()
                    .map(|(k, v)| CacheValue::try_from(v).map(|v| (k, v)))
                    .collect::<Result<IndexMap<_, _>>>()?,
            ),
        })
    }
}

/// String form used when a value takes part in key derivation.
///
/// Scalars render bare (`42`, `true`, `null`, `monthly`); lists and maps
/// render as compact JSON.
impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheValue::Null => f.write_str("null"),
            CacheValue::Bool(b) => write!(f, "{b}"),
            CacheValue::Integer(i) => write!(f, "{i}"),
            CacheValue::Float(x) => write!(f, "{}", x.into_inner()),
            CacheValue::String(s) => f.write_str(s),
            CacheValue::List(_) | CacheValue::Map(_) => {
                let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            },
        }
    }
}

// ==========================================
// From Conversions for Ergonomics
// ==========================================

impl From<bool> for CacheValue {
    fn from(v: bool) -> Self {
        CacheValue::Bool(v)
    }
}

impl From<i64> for CacheValue {
    fn from(v: i64) -> Self {
        CacheValue::Integer(v)
    }
}

impl From<i32> for CacheValue {
    fn from(v: i32) -> Self {
        CacheValue::Integer(v as i64)
    }
}

impl From<u32> for CacheValue {
    fn from(v: u32) -> Self {
        CacheValue::Integer(v as i64)
    }
}

impl From<f64> for CacheValue {
    fn from(v: f64) -> Self {
        CacheValue::Float(OrderedFloat(v))
    }
}

impl From<String> for CacheValue {
    fn from(v: String) -> Self {
        CacheValue::String(v)
    }
}

impl From<&str> for CacheValue {
    fn from(v: &str) -> Self {
        CacheValue::String(v.to_string())
    }
}

impl<T: Into<CacheValue>> From<Vec<T>> for CacheValue {
    fn from(v: Vec<T>) -> Self {
        CacheValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CacheValue>> From<Option<T>> for CacheValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CacheValue::Null, Into::into)
    }
}

impl From<IndexMap<String, CacheValue>> for CacheValue {
    fn from(v: IndexMap<String, CacheValue>) -> Self {
        CacheValue::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_value_creation() {
        let v: CacheValue = 42.into();
        assert_eq!(v, CacheValue::Integer(42));
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.as_f64(), Some(42.0));

        let s: CacheValue = "hello".into();
        assert_eq!(s.as_str(), Some("hello"));

        let none: CacheValue = Option::<i32>::None.into();
        assert!(none.is_null());
    }

    #[test]
    fn test_display_for_key_parts() {
        assert_eq!(CacheValue::Null.to_string(), "null");
        assert_eq!(CacheValue::from(true).to_string(), "true");
        assert_eq!(CacheValue::from(123).to_string(), "123");
        assert_eq!(CacheValue::from(2.5).to_string(), "2.5");
        assert_eq!(CacheValue::from("monthly").to_string(), "monthly");
        assert_eq!(CacheValue::from(vec![1, 2]).to_string(), "[1,2]");
    }

    #[test]
    fn test_from_serializable_struct() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Summary {
            account: String,
            total: f64,
            tags: Vec<String>,
        }

        let summary = Summary {
            account: "checking".into(),
            total: 1520.75,
            tags: vec!["groceries".into(), "rent".into()],
        };

        let value = CacheValue::from_serializable(&summary).unwrap();
        assert_eq!(value.get("account").and_then(|v| v.as_str()), Some("checking"));

        let back: Summary = value.into_deserialized().unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_from_serializable_rejects_non_string_keys() {
        let mut by_month = std::collections::HashMap::new();
        by_month.insert((1u8, 2u8), 10);

        let err = CacheValue::from_serializable(&by_month).unwrap_err();
        assert!(err.is_encoding());
    }

    #[test]
    fn test_from_serializable_rejects_large_unsigned() {
        let err = CacheValue::from_serializable(&u64::MAX).unwrap_err();
        assert!(err.is_encoding());
    }

    #[test]
    fn test_into_deserialized_type_mismatch() {
        let value = CacheValue::from("not a number");
        let err = value.into_deserialized::<i64>().unwrap_err();
        assert!(err.is_decoding());
    }

    #[test]
    fn test_find_unencodable_nested() {
        let mut map = IndexMap::new();
        map.insert("ok".to_string(), CacheValue::from(1));
        map.insert(
            "bad".to_string(),
            CacheValue::List(vec![CacheValue::from(f64::INFINITY)]),
        );

        let reason = CacheValue::Map(map).find_unencodable().unwrap();
        assert!(reason.starts_with("bad:"));
    }

    fn nested_lists(depth: usize) -> CacheValue {
        (0..depth).fold(CacheValue::from(1), |inner, _| CacheValue::List(vec![inner]))
    }

    #[test]
    fn test_find_unencodable_depth_limit() {
        assert!(nested_lists(MAX_NESTING_DEPTH).find_unencodable().is_none());

        for depth in [MAX_NESTING_DEPTH + 1, 129, 200] {
            let reason = nested_lists(depth).find_unencodable();
            assert!(reason.is_some(), "depth {depth} should be rejected");
        }
    }

    #[test]
    fn test_depth_limit_counts_maps() {
        let deep = (0..MAX_NESTING_DEPTH).fold(CacheValue::Null, |inner, i| {
            let mut map = IndexMap::new();
            map.insert(format!("k{i}"), inner);
            CacheValue::Map(map)
        });
        assert!(deep.find_unencodable().is_none());
        assert!(CacheValue::List(vec![deep]).find_unencodable().is_some());
    }
}
