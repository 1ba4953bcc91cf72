//! Transparent memoization of expensive computations.
//!
//! A [`Memoizer`] binds a store, a namespace and a TTL; [`Memoizer::wrap`]
//! turns an async computation into a [`Memoized`] one whose results are
//! served from the fast tier when possible.
//!
//! Every argument that affects the result must be part of the key arguments.
//! An argument left out of [`MemoArgs::key_args`] makes different inputs
//! share one cached result.

use std::future::Future;
use std::time::Duration;

use fincache_core::{CacheKey, CacheValue, KeyArgs, Namespace};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, debug_span};

use crate::cache::store::FastTierStore;
use crate::metrics::cache::record_memo_call;

/// Arguments of a memoized computation.
///
/// Implemented for [`KeyArgs`] (positional and named arguments) and for
/// tuples of values convertible into [`CacheValue`], which map to
/// positional arguments in order.
pub trait MemoArgs {
    /// Key arguments identifying this call.
    fn key_args(&self) -> KeyArgs;
}

impl MemoArgs for KeyArgs {
    fn key_args(&self) -> KeyArgs {
        self.clone()
    }
}

impl MemoArgs for () {
    fn key_args(&self) -> KeyArgs {
        KeyArgs::new()
    }
}

macro_rules! impl_memo_args_for_tuple {
    ($($name:ident),+) => {
        impl<$($name),+> MemoArgs for ($($name,)+)
        where
            $($name: Clone + Into<CacheValue>,)+
        {
            #[allow(non_snake_case)]
            fn key_args(&self) -> KeyArgs {
                let ($($name,)+) = self;
                KeyArgs::new()$(.arg($name.clone()))+
            }
        }
    };
}

impl_memo_args_for_tuple!(A);
impl_memo_args_for_tuple!(A, B);
impl_memo_args_for_tuple!(A, B, C);
impl_memo_args_for_tuple!(A, B, C, D);
impl_memo_args_for_tuple!(A, B, C, D, E);

/// Factory returned by [`FastTierStore::memoize`].
#[derive(Debug, Clone)]
pub struct Memoizer {
    store: FastTierStore,
    namespace: Namespace,
    ttl: Option<Duration>,
}

impl Memoizer {
    pub(crate) fn new(store: FastTierStore, namespace: Namespace, ttl: Option<Duration>) -> Self {
        Self {
            store,
            namespace,
            ttl,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Wraps a computation. The same memoizer can wrap several.
    pub fn wrap<F>(&self, computation: F) -> Memoized<F> {
        Memoized {
            memoizer: self.clone(),
            computation,
        }
    }
}

/// A computation whose successful results are cached.
#[derive(Debug, Clone)]
pub struct Memoized<F> {
    memoizer: Memoizer,
    computation: F,
}

impl<F> Memoized<F> {
    /// Key under which `args` would be cached.
    pub fn key_for<A: MemoArgs>(&self, args: &A) -> CacheKey {
        CacheKey::derive(&self.memoizer.namespace, &args.key_args())
    }

    /// Runs the computation through the cache.
    ///
    /// 1. Disabled store: the computation runs directly, no key is derived.
    /// 2. Hit: the cached result is returned and the computation does not run.
    /// 3. Miss: the computation runs; an `Ok` result is stored with the
    ///    memoizer's TTL, an `Err` is returned unchanged and nothing is stored.
    ///
    /// Get, compute and set are not atomic. Two concurrent misses on the same
    /// key both run the computation and the last write wins.
    pub async fn call<A, Fut, T, E>(&self, args: A) -> Result<T, E>
    where
        A: MemoArgs,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
    {
        let namespace = self.memoizer.namespace.as_str();
        let store = &self.memoizer.store;

        if !store.is_enabled() {
            record_memo_call(namespace, "bypass");
            return (self.computation)(args).await;
        }

        let key = self.key_for(&args);
        let span = debug_span!("memoize", namespace = %namespace, key = %key);

        async move {
            if let Some(cached) = store.get_as::<T>(&key).await {
                record_memo_call(namespace, "hit");
                return Ok(cached);
            }

            record_memo_call(namespace, "miss");
            let result = (self.computation)(args).await?;

            if !store.set_as(&key, &result, self.memoizer.ttl).await {
                debug!("Computed result was not cached");
            }
            Ok(result)
        }
        .instrument(span)
        .await
    }
}
