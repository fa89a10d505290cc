//! DES-CBC encryptor: block=8, IV=8. Historically ESP's original
//! transform (RFC 1829/2405) before AES-CBC and AEAD ciphers replaced it;
//! kept here as the pack's second `Encryptor` so the engine is exercised
//! against a block/IV size other than 16 bytes, not as a security
//! recommendation — single DES's 56-bit effective key is not adequate for
//! new deployments.

use cbc::{Decryptor as CbcDecryptor, Encryptor as CbcEncryptor};
use cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::Des;
use zeroize::Zeroize;

use crate::primitives::{Encryptor, PrimitiveError};

const BLOCK_SIZE: usize = 8;
const IV_SIZE: usize = 8;
const KEY_SIZE: usize = 8;

struct DesKey([u8; KEY_SIZE]);

impl Drop for DesKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// DES in CBC mode with no internal padding. Block and IV size are both 8
/// bytes.
pub struct DesCbcEncryptor {
    key: DesKey,
}

impl DesCbcEncryptor {
    /// Build from an 8-byte key.
    pub fn new(key: &[u8]) -> Result<Self, PrimitiveError> {
        let key: [u8; KEY_SIZE] = key
            .try_into()
            .map_err(|_| PrimitiveError::InvalidKeyLength { expected: KEY_SIZE, actual: key.len() })?;
        Ok(Self { key: DesKey(key) })
    }
}

impl Encryptor for DesCbcEncryptor {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn iv_size(&self) -> usize {
        IV_SIZE
    }

    fn encrypt_in_place(&self, buf: &mut [u8], iv: &[u8]) -> Result<(), PrimitiveError> {
        if buf.len() % BLOCK_SIZE != 0 {
            return Err(PrimitiveError::InvalidBlockAlignment);
        }
        let len = buf.len();
        let bad_iv = |_| PrimitiveError::InvalidIvLength { expected: IV_SIZE, actual: iv.len() };
        let bad_cipher = |_| PrimitiveError::CipherFailure;
        CbcEncryptor::<Des>::new_from_slices(&self.key.0, iv)
            .map_err(bad_iv)?
            .encrypt_padded_mut::<NoPadding>(buf, len)
            .map_err(bad_cipher)?;
        Ok(())
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        iv: &[u8],
        plaintext_out: &mut [u8],
    ) -> Result<(), PrimitiveError> {
        if ciphertext.len() != plaintext_out.len() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(PrimitiveError::InvalidBlockAlignment);
        }
        plaintext_out.copy_from_slice(ciphertext);
        let bad_iv = |_| PrimitiveError::InvalidIvLength { expected: IV_SIZE, actual: iv.len() };
        let bad_cipher = |_| PrimitiveError::CipherFailure;
        CbcDecryptor::<Des>::new_from_slices(&self.key.0, iv)
            .map_err(bad_iv)?
            .decrypt_padded_mut::<NoPadding>(plaintext_out)
            .map_err(bad_cipher)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Vec<u8> {
        (0u8..8).collect()
    }

    fn iv() -> Vec<u8> {
        (100u8..108).collect()
    }

    #[test]
    fn roundtrip_block_aligned_plaintext() {
        let enc = DesCbcEncryptor::new(&key()).expect("valid key length");
        let mut buf: Vec<u8> = (0u8..32).collect();
        let original = buf.clone();

        enc.encrypt_in_place(&mut buf, &iv()).expect("encrypt");
        assert_ne!(buf, original);

        let mut plaintext = vec![0u8; buf.len()];
        enc.decrypt(&buf, &iv(), &mut plaintext).expect("decrypt");
        assert_eq!(plaintext, original);
    }

    #[test]
    fn rejects_unaligned_buffer() {
        let enc = DesCbcEncryptor::new(&key()).expect("valid key length");
        let mut buf = vec![0u8; 9];
        assert!(enc.encrypt_in_place(&mut buf, &iv()).is_err());
    }

    #[test]
    fn rejects_bad_key_length() {
        assert!(DesCbcEncryptor::new(&[0u8; 7]).is_err());
    }

    #[test]
    fn block_and_iv_size_are_eight() {
        let enc = DesCbcEncryptor::new(&key()).expect("valid key length");
        assert_eq!(enc.block_size(), 8);
        assert_eq!(enc.iv_size(), 8);
    }
}
