//! Error kinds produced by the AEAD layer.

use thiserror::Error;

use crate::cipher::{KEY_LEN, NONCE_LEN, TAG_LEN};

/// Closed set of failure categories for [`AuthenticatedEncryptor`] calls.
///
/// Every variant is terminal for the call that produced it. None of them carry
/// key material, plaintext or nonce bytes, so they are safe to log.
///
/// [`AuthenticatedEncryptor`]: crate::AuthenticatedEncryptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AeadError {
    /// The key is not exactly [`KEY_LEN`] bytes.
    #[error("invalid key length: expected {KEY_LEN} bytes, got {actual}")]
    InvalidKeyLength { actual: usize },

    /// The nonce is not exactly [`NONCE_LEN`] bytes.
    #[error("invalid nonce length: expected {NONCE_LEN} bytes, got {actual}")]
    InvalidNonceLength { actual: usize },

    /// The working buffer for the cipher context could not be reserved.
    #[error("failed to acquire cipher context")]
    ContextInitFailed,

    /// The cipher rejected the key or nonce while initialising the context.
    #[error("cipher initialisation failed")]
    CipherInitFailed,

    /// An internal error occurred while encrypting.
    #[error("encryption failed")]
    EncryptionFailed,

    /// An internal error occurred while decrypting, unrelated to tag verification.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The tag did not verify. Ciphertext, tag, nonce, key or associated data
    /// differ from what was used to encrypt.
    #[error("authentication failed: expected a {TAG_LEN}-byte tag matching the data")]
    AuthenticationFailed,
}

impl AeadError {
    /// Short machine-readable name of the failure category.
    pub fn code(&self) -> &'static str {
        match self {
            AeadError::InvalidKeyLength { .. } => "invalid_key_length",
            AeadError::InvalidNonceLength { .. } => "invalid_nonce_length",
            AeadError::ContextInitFailed => "context_init_failed",
            AeadError::CipherInitFailed => "cipher_init_failed",
            AeadError::EncryptionFailed => "encryption_failed",
            AeadError::DecryptionFailed => "decryption_failed",
            AeadError::AuthenticationFailed => "authentication_failed",
        }
    }
}
