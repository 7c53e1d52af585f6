//! Self-describing containers around [`AuthenticatedEncryptor`] output.
//!
//! # Field format
//!
//! ```text
//! v1.<base64url-no-pad(nonce)>.<base64url-no-pad(ciphertext)>.<base64url-no-pad(tag)>
//! ```
//!
//! The `v1` prefix enables future algorithm or key-version migration without
//! breaking existing ciphertext.
//!
//! # Passphrase container
//!
//! ```text
//! salt (16) || nonce (12) || ciphertext || tag (16)
//! ```
//!
//! The key is derived from the passphrase and salt with [`derive_key`].

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

use crate::cipher::{generate_nonce, AuthenticatedEncryptor, Sealed, Tag, NONCE_LEN, TAG_LEN};
use crate::error::AeadError;
use crate::kdf::{derive_key, generate_salt, SALT_LEN};

/// Prefix that appears at the start of every encrypted field value.
pub const VERSION_PREFIX: &str = "v1";

/// Bytes preceding the ciphertext in a passphrase container.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

/// Smallest valid passphrase container: header plus tag, empty ciphertext.
pub const MIN_CONTAINER_LEN: usize = HEADER_LEN + TAG_LEN;

/// Errors produced when building or opening an envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The encrypted field string does not match the expected format.
    #[error("invalid encrypted field format")]
    InvalidFormat,

    /// The container is shorter than salt, nonce and tag together.
    #[error("encrypted data truncated: expected at least {MIN_CONTAINER_LEN} bytes, got {actual}")]
    Truncated { actual: usize },

    /// The underlying AEAD call failed.
    #[error(transparent)]
    Aead(#[from] AeadError),
}

/// A parsed, encrypted field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    /// Raw nonce bytes.
    pub nonce: [u8; NONCE_LEN],
    /// Raw ciphertext bytes.
    pub ciphertext: Vec<u8>,
    /// Authentication tag.
    pub tag: Tag,
}

impl EncryptedField {
    /// Encrypt `plaintext` under `key` with a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Propagates any [`AeadError`] from the encryptor.
    pub fn seal(plaintext: &[u8], key: &[u8], associated_data: &[u8]) -> Result<Self, AeadError> {
        Self::seal_with_nonce(plaintext, key, generate_nonce(), associated_data)
    }

    /// Encrypt `plaintext` under a caller-chosen nonce.
    pub fn seal_with_nonce(
        plaintext: &[u8],
        key: &[u8],
        nonce: [u8; NONCE_LEN],
        associated_data: &[u8],
    ) -> Result<Self, AeadError> {
        let Sealed { ciphertext, tag } =
            AuthenticatedEncryptor::encrypt(plaintext, key, &nonce, associated_data)?;
        Ok(Self {
            nonce,
            ciphertext,
            tag,
        })
    }

    /// Verify and decrypt this field.
    ///
    /// # Errors
    ///
    /// Returns [`AeadError::AuthenticationFailed`] on a wrong key, wrong
    /// associated data or tampered field.
    pub fn open(&self, key: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, AeadError> {
        AuthenticatedEncryptor::decrypt(
            &self.ciphertext,
            &self.tag,
            key,
            &self.nonce,
            associated_data,
        )
    }
}

impl fmt::Display for EncryptedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            VERSION_PREFIX,
            URL_SAFE_NO_PAD.encode(self.nonce),
            URL_SAFE_NO_PAD.encode(&self.ciphertext),
            URL_SAFE_NO_PAD.encode(self.tag.as_bytes()),
        )
    }
}

impl FromStr for EncryptedField {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 4 || parts[0] != VERSION_PREFIX {
            return Err(EnvelopeError::InvalidFormat);
        }
        let nonce: [u8; NONCE_LEN] = decode_part(parts[1])?
            .try_into()
            .map_err(|_| EnvelopeError::InvalidFormat)?;
        let ciphertext = decode_part(parts[2])?;
        let tag = Tag::from_slice(&decode_part(parts[3])?).map_err(|_| EnvelopeError::InvalidFormat)?;

        Ok(Self {
            nonce,
            ciphertext,
            tag,
        })
    }
}

fn decode_part(part: &str) -> Result<Vec<u8>, EnvelopeError> {
    URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| EnvelopeError::InvalidFormat)
}

/// Seal `data` under a key derived from `passphrase`.
///
/// A fresh salt and nonce are generated per call.
pub fn seal_with_passphrase(data: &[u8], passphrase: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let salt = generate_salt();
    let nonce = generate_nonce();
    let key = derive_key(passphrase, &salt);
    let sealed = AuthenticatedEncryptor::encrypt(data, key.as_bytes(), &nonce, &[])?;

    let mut out = Vec::with_capacity(HEADER_LEN + sealed.ciphertext.len() + TAG_LEN);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed.ciphertext);
    out.extend_from_slice(sealed.tag.as_bytes());
    Ok(out)
}

/// Open a container produced by [`seal_with_passphrase`].
///
/// # Errors
///
/// Returns [`EnvelopeError::Truncated`] if `blob` is too short, or
/// [`EnvelopeError::Aead`] with [`AeadError::AuthenticationFailed`] for a wrong
/// passphrase or tampered data.
pub fn open_with_passphrase(blob: &[u8], passphrase: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    if blob.len() < MIN_CONTAINER_LEN {
        return Err(EnvelopeError::Truncated { actual: blob.len() });
    }
    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, rest) = rest.split_at(NONCE_LEN);
    let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);

    let key = derive_key(passphrase, salt);
    let tag = Tag::from_slice(tag)?;
    Ok(AuthenticatedEncryptor::decrypt(
        ciphertext,
        &tag,
        key.as_bytes(),
        nonce,
        &[],
    )?)
}
