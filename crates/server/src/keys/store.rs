//! [`KeyStore`]: thread-safe holder for the service encryption key.

use std::sync::Arc;

use solace_crypto::{AeadError, SecretKey, KEY_LEN};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors produced by the key layer.
#[derive(Debug, Error)]
pub enum KeyError {
    /// No key has been loaded yet.
    #[error("encryption key not yet initialised")]
    NotInitialised,

    /// The key material has an unexpected length.
    #[error("key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Thread-safe store for the current encryption key.
///
/// Wraps an `Arc<RwLock<Option<SecretKey>>>` so that many request handlers can
/// read the key concurrently. Each handler takes a short-lived clone that is
/// wiped when it goes out of scope.
#[derive(Clone, Debug, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<Option<SecretKey>>>,
}

impl KeyStore {
    /// Create a new, empty [`KeyStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a key is currently loaded.
    pub async fn is_ready(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Store (or replace) the current key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if the slice is not [`KEY_LEN`] bytes.
    pub async fn store(&self, key_bytes: &[u8]) -> Result<(), KeyError> {
        let key = SecretKey::from_slice(key_bytes).map_err(|e| match e {
            AeadError::InvalidKeyLength { actual } => KeyError::InvalidLength(actual),
            _ => KeyError::InvalidLength(key_bytes.len()),
        })?;
        *self.inner.write().await = Some(key);
        Ok(())
    }

    /// Clone the current key for one request.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::NotInitialised`] if no key has been stored yet.
    pub async fn current(&self) -> Result<SecretKey, KeyError> {
        let lock = self.inner.read().await;
        lock.as_ref().cloned().ok_or(KeyError::NotInitialised)
    }
}
