//! AES-256-GCM encryption and decryption of whole buffers.
//!
//! **Nonce uniqueness is the caller's job.** [`AuthenticatedEncryptor`] takes
//! the nonce as an argument and does not remember it. Reusing a nonce under the
//! same key breaks both confidentiality and authentication; use
//! [`generate_nonce`] or a counter that never repeats.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::context::{CipherContext, Direction};
use crate::error::AeadError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of an AES-GCM authentication tag (16 bytes = 128 bits).
pub const TAG_LEN: usize = 16;

/// Full-length GCM authentication tag.
///
/// Equality is constant-time so that comparing a received tag against an
/// expected one does not leak how many leading bytes matched.
#[derive(Debug, Clone, Copy)]
pub struct Tag([u8; TAG_LEN]);

impl Tag {
    /// Parse a tag from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`AeadError::DecryptionFailed`] if `bytes` is not exactly
    /// [`TAG_LEN`] long. Tags are never truncated.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AeadError> {
        let arr: [u8; TAG_LEN] = bytes.try_into().map_err(|_| AeadError::DecryptionFailed)?;
        Ok(Self(arr))
    }

    /// Raw tag bytes.
    pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }
}

impl From<[u8; TAG_LEN]> for Tag {
    fn from(bytes: [u8; TAG_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Tag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for Tag {}

/// Output of a successful [`AuthenticatedEncryptor::encrypt`] call.
///
/// Both parts, plus the nonce and associated data used, are needed to decrypt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Encrypted bytes, always the same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// Authentication tag over the ciphertext and associated data.
    pub tag: Tag,
}

/// Stateless AES-256-GCM encryptor.
///
/// Holds no state between calls. Every call builds its own cipher context and
/// releases it before returning, so concurrent calls from different threads
/// never share anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedEncryptor;

impl AuthenticatedEncryptor {
    /// Encrypt `plaintext` under `key` and `nonce`, authenticating
    /// `associated_data` alongside it.
    ///
    /// `plaintext` and `associated_data` may be empty.
    ///
    /// # Errors
    ///
    /// - [`AeadError::InvalidKeyLength`] / [`AeadError::InvalidNonceLength`]
    ///   before any context is acquired.
    /// - [`AeadError::ContextInitFailed`], [`AeadError::CipherInitFailed`] or
    ///   [`AeadError::EncryptionFailed`] from the cipher context.
    pub fn encrypt(
        plaintext: &[u8],
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
    ) -> Result<Sealed, AeadError> {
        check_lengths(key, nonce)?;

        let mut ctx = CipherContext::acquire(Direction::Encrypt, plaintext.len())?;
        ctx.init(key, nonce)?;
        if !associated_data.is_empty() {
            ctx.set_aad(associated_data)?;
        }
        ctx.update(plaintext)?;
        let sealed = ctx.finalize_encrypt()?;

        debug!(
            algorithm = "AES-256-GCM",
            plaintext_len = plaintext.len(),
            aad_len = associated_data.len(),
            "encryption completed"
        );
        Ok(sealed)
    }

    /// Verify and decrypt `ciphertext`.
    ///
    /// No plaintext is returned unless `tag` verifies over the ciphertext and
    /// `associated_data`.
    ///
    /// # Errors
    ///
    /// - [`AeadError::InvalidKeyLength`] / [`AeadError::InvalidNonceLength`]
    ///   before any context is acquired.
    /// - [`AeadError::AuthenticationFailed`] if anything was modified or the
    ///   key, nonce or associated data differ from encryption.
    /// - [`AeadError::ContextInitFailed`], [`AeadError::CipherInitFailed`] or
    ///   [`AeadError::DecryptionFailed`] from the cipher context.
    pub fn decrypt(
        ciphertext: &[u8],
        tag: &Tag,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, AeadError> {
        check_lengths(key, nonce)?;

        let mut ctx = CipherContext::acquire(Direction::Decrypt, ciphertext.len())?;
        ctx.init(key, nonce)?;
        if !associated_data.is_empty() {
            ctx.set_aad(associated_data)?;
        }
        ctx.update(ciphertext)?;
        let plaintext = ctx.finalize_decrypt(tag)?;

        debug!(
            algorithm = "AES-256-GCM",
            ciphertext_len = ciphertext.len(),
            aad_len = associated_data.len(),
            "decryption completed"
        );
        Ok(plaintext)
    }

    /// Convenience wrapper around [`decrypt`](Self::decrypt) for a [`Sealed`] value.
    pub fn open(
        sealed: &Sealed,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, AeadError> {
        Self::decrypt(&sealed.ciphertext, &sealed.tag, key, nonce, associated_data)
    }
}

/// Generate a fresh random nonce from the OS CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

fn check_lengths(key: &[u8], nonce: &[u8]) -> Result<(), AeadError> {
    if key.len() != KEY_LEN {
        return Err(AeadError::InvalidKeyLength { actual: key.len() });
    }
    if nonce.len() != NONCE_LEN {
        return Err(AeadError::InvalidNonceLength {
            actual: nonce.len(),
        });
    }
    Ok(())
}
