//! Property tests for the AEAD laws of `AuthenticatedEncryptor`.
//!
//! - decrypt(encrypt(pt)) == pt
//! - any single-bit change to ciphertext, tag or associated data is rejected
//!   with `AuthenticationFailed` and never yields plaintext

use proptest::prelude::*;
use solace_crypto::{AeadError, AuthenticatedEncryptor, Tag, KEY_LEN, NONCE_LEN, TAG_LEN};

fn inputs() -> impl Strategy<Value = ([u8; KEY_LEN], [u8; NONCE_LEN], Vec<u8>, Vec<u8>)> {
    (
        prop::array::uniform32(any::<u8>()),
        prop::array::uniform12(any::<u8>()),
        prop::collection::vec(any::<u8>(), 0..512),
        prop::collection::vec(any::<u8>(), 0..64),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn round_trip((key, nonce, pt, aad) in inputs()) {
        let sealed = AuthenticatedEncryptor::encrypt(&pt, &key, &nonce, &aad).unwrap();
        prop_assert_eq!(sealed.ciphertext.len(), pt.len());
        prop_assert_eq!(sealed.tag.as_bytes().len(), TAG_LEN);

        let out = AuthenticatedEncryptor::open(&sealed, &key, &nonce, &aad).unwrap();
        prop_assert_eq!(out, pt);
    }

    #[test]
    fn ciphertext_bit_flip_rejected(
        (key, nonce, pt, aad) in inputs(),
        bit in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!pt.is_empty());
        let mut sealed = AuthenticatedEncryptor::encrypt(&pt, &key, &nonce, &aad).unwrap();
        let i = bit.index(sealed.ciphertext.len() * 8);
        sealed.ciphertext[i / 8] ^= 1 << (i % 8);

        prop_assert_eq!(
            AuthenticatedEncryptor::open(&sealed, &key, &nonce, &aad),
            Err(AeadError::AuthenticationFailed)
        );
    }

    #[test]
    fn tag_bit_flip_rejected(
        (key, nonce, pt, aad) in inputs(),
        bit in 0..TAG_LEN * 8,
    ) {
        let sealed = AuthenticatedEncryptor::encrypt(&pt, &key, &nonce, &aad).unwrap();
        let mut raw = *sealed.tag.as_bytes();
        raw[bit / 8] ^= 1 << (bit % 8);

        prop_assert_eq!(
            AuthenticatedEncryptor::decrypt(&sealed.ciphertext, &Tag::from(raw), &key, &nonce, &aad),
            Err(AeadError::AuthenticationFailed)
        );
    }

    #[test]
    fn associated_data_bit_flip_rejected(
        (key, nonce, pt, aad) in inputs(),
        bit in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!aad.is_empty());
        let sealed = AuthenticatedEncryptor::encrypt(&pt, &key, &nonce, &aad).unwrap();
        let mut other = aad.clone();
        let i = bit.index(other.len() * 8);
        other[i / 8] ^= 1 << (i % 8);

        prop_assert_eq!(
            AuthenticatedEncryptor::open(&sealed, &key, &nonce, &other),
            Err(AeadError::AuthenticationFailed)
        );
    }
}

#[test]
fn dropping_associated_data_is_rejected() {
    let key = [5u8; KEY_LEN];
    let nonce = [6u8; NONCE_LEN];
    let sealed = AuthenticatedEncryptor::encrypt(b"payload", &key, &nonce, b"ad").unwrap();
    assert_eq!(
        AuthenticatedEncryptor::open(&sealed, &key, &nonce, b""),
        Err(AeadError::AuthenticationFailed)
    );
}
