//! AES-256-GCM authenticated encryption for `solace`.
//!
//! The core is [`AuthenticatedEncryptor`]: one stateless call to encrypt a
//! buffer into ciphertext plus tag, and one to verify and decrypt it. Each call
//! runs inside a scoped cipher context that is released on every exit path.
//!
//! Built on top of it:
//! - [`kdf`]: PBKDF2 passphrase → key derivation.
//! - [`envelope`]: the `v1.` text field format and the salted passphrase container.
//! - [`file`]: whole-file encryption, decryption and secure deletion.
//!
//! This crate is intentionally free of HTTP and async dependencies.
//!
//! # Telemetry invariants
//!
//! - **No key material, passphrases, plaintext or nonces** appear in any log
//!   field or error message; only lengths and operation names are recorded.

pub mod cipher;
mod context;
pub mod envelope;
pub mod error;
pub mod file;
pub mod kdf;
pub mod key;

pub use cipher::{generate_nonce, AuthenticatedEncryptor, Sealed, Tag, KEY_LEN, NONCE_LEN, TAG_LEN};
pub use envelope::{EncryptedField, EnvelopeError};
pub use error::AeadError;
pub use key::SecretKey;
