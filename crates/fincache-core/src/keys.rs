//! Cache key derivation.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::namespace::Namespace;
use crate::value::CacheValue;

/// Canonical keys longer than this are replaced by a hashed form.
pub const MAX_KEY_LENGTH: usize = 200;

/// Separator between the parts of a canonical key.
pub const KEY_DELIMITER: &str = ":";

/// Arguments of a cached computation: positional values in call order plus
/// named values.
///
/// Named values live in a `BTreeMap`, so the order in which they are added
/// never changes the derived key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyArgs {
    positional: Vec<CacheValue>,
    named: BTreeMap<String, CacheValue>,
}

impl KeyArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<CacheValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named argument, replacing any previous value for `name`.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<CacheValue>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[CacheValue] {
        &self.positional
    }

    pub fn named_args(&self) -> &BTreeMap<String, CacheValue> {
        &self.named
    }

    /// Returns a named argument.
    pub fn get(&self, name: &str) -> Option<&CacheValue> {
        self.named.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// A derived cache key.
///
/// Keys follow `{namespace}:{positional...}:{name:value...}`, named parts
/// sorted by name. When that form exceeds [`MAX_KEY_LENGTH`] characters the
/// key becomes `{namespace}:hash:{sha256}` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a namespace and argument list.
    ///
    /// # Examples
    ///
    /// ```
    /// use fincache_core::{CacheKey, KeyArgs, Namespace};
    ///
    /// let ns = Namespace::new("forecast").unwrap();
    /// let args = KeyArgs::new().arg(42).named("months", 6).named("scenario", "base");
    ///
    /// let key = CacheKey::derive(&ns, &args);
    /// assert_eq!(key.as_str(), "forecast:42:months:6:scenario:base");
    /// ```
    pub fn derive(namespace: &Namespace, args: &KeyArgs) -> Self {
        let canonical = canonical_form(namespace, args);

        if canonical.chars().count() > MAX_KEY_LENGTH {
            let digest = Sha256::digest(canonical.as_bytes());
            return Self(format!(
                "{}{KEY_DELIMITER}hash{KEY_DELIMITER}{}",
                namespace,
                hex::encode(digest)
            ));
        }

        Self(canonical)
    }

    /// Wraps an already formed key, e.g. one given by an operator.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the key is the hashed form of an oversized key.
    pub fn is_hashed(&self) -> bool {
        let mut parts = self.0.split(KEY_DELIMITER);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some("hash"), Some(digest), None) => {
                digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())
            },
            _ => false,
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn canonical_form(namespace: &Namespace, args: &KeyArgs) -> String {
    let mut parts = Vec::with_capacity(1 + args.positional.len() + args.named.len());
    parts.push(namespace.to_string());
    parts.extend(args.positional.iter().map(ToString::to_string));
    parts.extend(
        args.named
            .iter()
            .map(|(name, value)| format!("{name}{KEY_DELIMITER}{value}")),
    );
    parts.join(KEY_DELIMITER)
}
