//! Passphrase → key derivation with PBKDF2-HMAC-SHA256.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::cipher::KEY_LEN;
use crate::key::SecretKey;

/// Byte length of the random salt stored next to passphrase-sealed data.
pub const SALT_LEN: usize = 16;

/// PBKDF2 iteration count for passphrase-derived keys.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Generate a fresh random salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive an AES-256 key from `passphrase` and `salt`.
///
/// Deterministic: the same passphrase and salt always give the same key.
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> SecretKey {
    derive_key_with_rounds(passphrase, salt, PBKDF2_ITERATIONS)
}

pub(crate) fn derive_key_with_rounds(passphrase: &[u8], salt: &[u8], rounds: u32) -> SecretKey {
    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, rounds, &mut out[..]);
    SecretKey::from_array(&mut out)
}
