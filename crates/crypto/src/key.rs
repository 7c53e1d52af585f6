//! [`SecretKey`]: owned AES-256 key material that is wiped on drop.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::cipher::KEY_LEN;
use crate::error::AeadError;

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// The bytes live on the heap so that moving a `SecretKey` around does not
/// leave stray copies on the stack. When this type is dropped, the memory is
/// overwritten with zeroes.
#[derive(Clone)]
pub struct SecretKey(Box<[u8; KEY_LEN]>);

impl SecretKey {
    /// Copy key material out of a slice.
    ///
    /// # Errors
    ///
    /// Returns [`AeadError::InvalidKeyLength`] if `bytes` is not [`KEY_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AeadError> {
        if bytes.len() != KEY_LEN {
            return Err(AeadError::InvalidKeyLength {
                actual: bytes.len(),
            });
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Move a key out of `bytes` into a boxed key, zeroing `bytes`.
    pub fn from_array(bytes: &mut [u8; KEY_LEN]) -> Self {
        let key = Self(Box::new(*bytes));
        bytes.zeroize();
        key
    }

    /// Borrow the raw key bytes for a single cipher call.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SecretKey {}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}
