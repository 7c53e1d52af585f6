//! Scoped AES-256-GCM computation context.
//!
//! A [`CipherContext`] lives for exactly one encrypt or decrypt call and moves
//! through a strictly linear lifecycle:
//!
//! ```text
//! Created → Initialized → (Updating)* → Finalized → Released
//! ```
//!
//! Release is tied to `Drop`, so it happens on the success path, on every
//! early `?` return and on unwinding. Releasing wipes the working buffer and
//! the expanded key schedule. Any out-of-order transition is a failure of the
//! call; there is no retry in place.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag as GcmTag,
};
use tracing::trace;
use zeroize::Zeroizing;

use crate::cipher::{Sealed, Tag, NONCE_LEN, TAG_LEN};
use crate::error::AeadError;

/// Which way data flows through the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

/// Position of a context in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContextState {
    Created,
    Initialized,
    Updating,
    Finalized,
}

/// Single-use cipher context owning the working buffer for one message.
///
/// The buffer is reserved up front for the whole message so that appending
/// input never reallocates and leaves an unwiped copy behind.
pub(crate) struct CipherContext<'a> {
    direction: Direction,
    state: ContextState,
    cipher: Option<Aes256Gcm>,
    nonce: [u8; NONCE_LEN],
    aad: &'a [u8],
    buffer: Zeroizing<Vec<u8>>,
}

impl<'a> CipherContext<'a> {
    /// Acquire a context able to hold `message_len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AeadError::ContextInitFailed`] if the working buffer cannot be
    /// reserved.
    pub(crate) fn acquire(direction: Direction, message_len: usize) -> Result<Self, AeadError> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(message_len)
            .map_err(|_| AeadError::ContextInitFailed)?;

        #[cfg(test)]
        live::acquired();
        trace!(?direction, message_len, "cipher context acquired");

        Ok(Self {
            direction,
            state: ContextState::Created,
            cipher: None,
            nonce: [0u8; NONCE_LEN],
            aad: &[],
            buffer: Zeroizing::new(buffer),
        })
    }

    /// Key the context and fix its nonce. `Created → Initialized`.
    ///
    /// # Errors
    ///
    /// Returns [`AeadError::CipherInitFailed`] if the cipher rejects the key
    /// or the nonce has the wrong size.
    pub(crate) fn init(&mut self, key: &[u8], nonce: &[u8]) -> Result<(), AeadError> {
        self.expect_state(&[ContextState::Created])?;

        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| AeadError::CipherInitFailed)?;
        self.nonce = nonce
            .try_into()
            .map_err(|_| AeadError::CipherInitFailed)?;
        self.cipher = Some(cipher);
        self.state = ContextState::Initialized;
        Ok(())
    }

    /// Supply associated data. Only valid directly after [`init`](Self::init).
    pub(crate) fn set_aad(&mut self, aad: &'a [u8]) -> Result<(), AeadError> {
        self.expect_state(&[ContextState::Initialized])?;
        self.aad = aad;
        Ok(())
    }

    /// Append message bytes to the working buffer.
    ///
    /// May be called any number of times; the total must not exceed the
    /// length the context was acquired for.
    pub(crate) fn update(&mut self, data: &[u8]) -> Result<(), AeadError> {
        self.expect_state(&[ContextState::Initialized, ContextState::Updating])?;
        if self.buffer.capacity() - self.buffer.len() < data.len() {
            return Err(self.failure());
        }
        self.buffer.extend_from_slice(data);
        self.state = ContextState::Updating;
        Ok(())
    }

    /// Encrypt the accumulated buffer and extract the tag.
    ///
    /// # Errors
    ///
    /// Returns [`AeadError::EncryptionFailed`] on misuse or if the message
    /// exceeds the GCM length limit.
    pub(crate) fn finalize_encrypt(mut self) -> Result<Sealed, AeadError> {
        if self.direction != Direction::Encrypt {
            return Err(self.failure());
        }
        self.expect_state(&[ContextState::Initialized, ContextState::Updating])?;
        let cipher = self.cipher.as_ref().ok_or(AeadError::EncryptionFailed)?;

        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&self.nonce), self.aad, &mut self.buffer)
            .map_err(|_| AeadError::EncryptionFailed)?;
        self.state = ContextState::Finalized;

        let mut tag_bytes = [0u8; TAG_LEN];
        tag_bytes.copy_from_slice(tag.as_slice());
        let ciphertext = std::mem::take(&mut *self.buffer);
        Ok(Sealed {
            ciphertext,
            tag: Tag::from(tag_bytes),
        })
    }

    /// Verify `tag` over the accumulated ciphertext and decrypt it.
    ///
    /// The tag comparison is constant-time. On mismatch the buffer is never
    /// handed out; it is wiped when the context is released.
    ///
    /// # Errors
    ///
    /// Returns [`AeadError::AuthenticationFailed`] if the tag does not verify,
    /// or [`AeadError::DecryptionFailed`] on misuse.
    pub(crate) fn finalize_decrypt(mut self, tag: &Tag) -> Result<Vec<u8>, AeadError> {
        if self.direction != Direction::Decrypt {
            return Err(self.failure());
        }
        self.expect_state(&[ContextState::Initialized, ContextState::Updating])?;
        let cipher = self.cipher.as_ref().ok_or(AeadError::DecryptionFailed)?;

        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&self.nonce),
                self.aad,
                &mut self.buffer,
                GcmTag::from_slice(tag.as_bytes()),
            )
            .map_err(|_| AeadError::AuthenticationFailed)?;
        self.state = ContextState::Finalized;

        Ok(std::mem::take(&mut *self.buffer))
    }

    fn expect_state(&self, allowed: &[ContextState]) -> Result<(), AeadError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.failure())
        }
    }

    fn failure(&self) -> AeadError {
        match self.direction {
            Direction::Encrypt => AeadError::EncryptionFailed,
            Direction::Decrypt => AeadError::DecryptionFailed,
        }
    }
}

impl Drop for CipherContext<'_> {
    fn drop(&mut self) {
        // Aes256Gcm wipes its key schedule on drop; the buffer is Zeroizing.
        drop(self.cipher.take());
        #[cfg(test)]
        live::released();
        trace!(direction = ?self.direction, state = ?self.state, "cipher context released");
    }
}
