//! Loading the service encryption key.
//!
//! The key is read once at startup from the file named by `KEY_FILE`, which
//! holds the 32 key bytes as standard base64. Provisioning that file (secret
//! store mount, config management) happens outside this service.
//!
//! # Security invariants
//!
//! - The key is **never** logged or included in traces.
//! - Intermediate buffers holding the file contents are wiped after use.

pub mod store;

pub use store::KeyStore;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::info;
use zeroize::Zeroizing;

/// Read the base64 key from `path` and store it in `store`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid base64, or does
/// not decode to exactly 32 bytes.
pub async fn load_from_file(path: &str, store: &KeyStore) -> Result<()> {
    let encoded = Zeroizing::new(
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read key file {path}"))?,
    );
    let decoded = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .context("key file must contain base64-encoded key material")?,
    );

    store
        .store(&decoded)
        .await
        .context("failed to store key (unexpected key length)")?;

    info!("encryption key loaded");
    Ok(())
}
