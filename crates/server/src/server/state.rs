//! Shared application state injected into every Axum handler.

use crate::keys::KeyStore;

/// Application state shared across all request handlers.
///
/// Cheaply cloneable: the key store is `Arc`-backed, so Axum can clone the
/// state for each request without copying key material.
#[derive(Clone, Default)]
pub struct AppState {
    /// Thread-safe store for the service encryption key.
    pub key_store: KeyStore,
}

impl AppState {
    /// Create a new [`AppState`] around the provided key store.
    pub fn new(key_store: KeyStore) -> Self {
        Self { key_store }
    }
}
