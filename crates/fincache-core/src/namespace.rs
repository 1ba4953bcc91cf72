//! Cache namespaces and invalidation scopes.
//!
//! Every cache-eligible computation owns one namespace. Keys follow the
//! `{namespace}:{owner_id}:{discriminators...}` convention so that all
//! entries of one owner can be swept with `{namespace}:{owner_id}:*`.

use std::fmt;

use crate::error::{CacheError, Result};

/// Maximum length of a namespace name.
pub const MAX_NAMESPACE_LENGTH: usize = 64;

/// Namespaces registered by default for the finance backend.
pub const DEFAULT_NAMESPACES: &[&str] = &[
    "forecast",
    "report",
    "analytics",
    "dashboard",
    "budget_progress",
];

/// A validated key prefix identifying one logical cache domain.
///
/// Names are non-empty, at most [`MAX_NAMESPACE_LENGTH`] characters, and
/// contain neither the key delimiter `:` nor glob metacharacters, so a
/// namespace can never widen an invalidation pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Validates and creates a namespace.
    ///
    /// ```
    /// use fincache_core::Namespace;
    ///
    /// let ns = Namespace::new("forecast").unwrap();
    /// assert_eq!(ns.scope_pattern("42"), "forecast:42:*");
    ///
    /// assert!(Namespace::new("fore:cast").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(CacheError::invalid_namespace(name, "must not be empty"));
        }
        if name.chars().count() > MAX_NAMESPACE_LENGTH {
            return Err(CacheError::invalid_namespace(
                name,
                format!("longer than {MAX_NAMESPACE_LENGTH} characters"),
            ));
        }
        if let Some(c) = name
            .chars()
            .find(|c| matches!(c, ':' | '*' | '?' | '[' | ']' | '\\') || c.is_whitespace())
        {
            return Err(CacheError::invalid_namespace(
                name.clone(),
                format!("contains reserved character '{c}'"),
            ));
        }

        Ok(Self(name))
    }

    /// Returns the namespace name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Glob pattern matching every entry of `owner_id` in this namespace.
    pub fn scope_pattern(&self, owner_id: &str) -> String {
        format!("{}:{}:*", self.0, escape_glob(owner_id))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Escapes glob metacharacters using single-character classes.
///
/// The bracket form is understood both by the network store's `MATCH`
/// syntax and by the `glob` crate. A backslash becomes `[\\]`: the network
/// store reads it as an escaped backslash inside the class, the `glob`
/// crate as a class holding only `\`. Either way it matches one literal
/// backslash.
pub fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            },
            '\\' => escaped.push_str("[\\\\]"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The central list of namespaces swept when an owner is invalidated.
///
/// Adding a cache-eligible computation means registering its namespace
/// here; nothing is discovered implicitly.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    namespaces: Vec<Namespace>,
}

impl NamespaceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`DEFAULT_NAMESPACES`].
    pub fn finance_defaults() -> Self {
        let mut registry = Self::new();
        for name in DEFAULT_NAMESPACES {
            if let Ok(ns) = Namespace::new(*name) {
                registry.register(ns);
            }
        }
        registry
    }

    /// Registers a namespace. Registering the same namespace twice is a no-op.
    pub fn register(&mut self, namespace: Namespace) -> &mut Self {
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, namespace: Namespace) -> Self {
        self.register(namespace);
        self
    }

    /// Returns the registered namespaces in registration order.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Returns true if the namespace is registered.
    pub fn contains(&self, namespace: &Namespace) -> bool {
        self.namespaces.contains(namespace)
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Builds the invalidation scope of one owner.
    pub fn scope(&self, owner_id: impl Into<String>) -> InvalidationScope {
        InvalidationScope {
            owner_id: owner_id.into(),
            namespaces: self.namespaces.clone(),
        }
    }
}

/// An owner plus the namespaces to sweep for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationScope {
    owner_id: String,
    namespaces: Vec<Namespace>,
}

impl InvalidationScope {
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// One `{namespace}:{owner_id}:*` pattern per namespace.
    pub fn patterns(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .map(|ns| ns.scope_pattern(&self.owner_id))
            .collect()
    }
}
