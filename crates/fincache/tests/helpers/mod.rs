//! Test helpers para fincache.

#![allow(dead_code, unused_imports)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fincache::{FastTierConfig, FastTierStore};
use fincache_core::Namespace;

/// Store en memoria, suficiente para las propiedades del engine.
pub fn memory_store() -> FastTierStore {
    FastTierStore::in_memory(1_000)
}

/// Configuracion que apunta a un puerto donde no escucha nadie.
pub fn unreachable_config() -> FastTierConfig {
    FastTierConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        connect_timeout_ms: 200,
        operation_timeout_ms: 200,
        ..FastTierConfig::default()
    }
}

pub fn ns(name: &str) -> Namespace {
    Namespace::new(name).expect("valid test namespace")
}

pub const SHORT_TTL: Duration = Duration::from_secs(1);

/// Cuenta las invocaciones de una computacion envuelta.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
