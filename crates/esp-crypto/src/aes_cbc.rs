//! AES-CBC encryptor: one concrete `Encryptor` implementation, selected by
//! key length (AES-128/192/256). No internal padding — the ESP padding
//! codec already aligns the plaintext to the block size before this is
//! invoked, so `NoPadding` is used throughout.

use aes::{Aes128, Aes192, Aes256};
use cbc::{Decryptor as CbcDecryptor, Encryptor as CbcEncryptor};
use cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroize;

use crate::primitives::{Encryptor, PrimitiveError};

const BLOCK_SIZE: usize = 16;
const IV_SIZE: usize = 16;

enum AesKey {
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

impl Drop for AesKey {
    fn drop(&mut self) {
        match self {
            AesKey::Aes128(k) => k.zeroize(),
            AesKey::Aes192(k) => k.zeroize(),
            AesKey::Aes256(k) => k.zeroize(),
        }
    }
}

/// AES in CBC mode, selected by key length (16, 24, or 32 bytes). Block and
/// IV size are both 16 bytes regardless of key size.
pub struct AesCbcEncryptor {
    key: AesKey,
}

impl AesCbcEncryptor {
    /// Build from raw key bytes. Key length selects AES-128/192/256.
    pub fn new(key: &[u8]) -> Result<Self, PrimitiveError> {
        let key = match key.len() {
            16 => AesKey::Aes128(key.try_into().expect("length checked above")),
            24 => AesKey::Aes192(key.try_into().expect("length checked above")),
            32 => AesKey::Aes256(key.try_into().expect("length checked above")),
            actual => return Err(PrimitiveError::InvalidKeyLength { expected: 32, actual }),
        };
        Ok(Self { key })
    }
}

impl Encryptor for AesCbcEncryptor {
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
        match &self.key {
            AesKey::Aes128(k) => {
                CbcEncryptor::<Aes128>::new_from_slices(k, iv)
                    .map_err(bad_iv)?
                    .encrypt_padded_mut::<NoPadding>(buf, len)
                    .map_err(bad_cipher)?;
            }
            AesKey::Aes192(k) => {
                CbcEncryptor::<Aes192>::new_from_slices(k, iv)
                    .map_err(bad_iv)?
                    .encrypt_padded_mut::<NoPadding>(buf, len)
                    .map_err(bad_cipher)?;
            }
            AesKey::Aes256(k) => {
                CbcEncryptor::<Aes256>::new_from_slices(k, iv)
                    .map_err(bad_iv)?
                    .encrypt_padded_mut::<NoPadding>(buf, len)
                    .map_err(bad_cipher)?;
            }
        }
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
        match &self.key {
            AesKey::Aes128(k) => {
                CbcDecryptor::<Aes128>::new_from_slices(k, iv)
                    .map_err(bad_iv)?
                    .decrypt_padded_mut::<NoPadding>(plaintext_out)
                    .map_err(bad_cipher)?;
            }
            AesKey::Aes192(k) => {
                CbcDecryptor::<Aes192>::new_from_slices(k, iv)
                    .map_err(bad_iv)?
                    .decrypt_padded_mut::<NoPadding>(plaintext_out)
                    .map_err(bad_cipher)?;
            }
            AesKey::Aes256(k) => {
                CbcDecryptor::<Aes256>::new_from_slices(k, iv)
                    .map_err(bad_iv)?
                    .decrypt_padded_mut::<NoPadding>(plaintext_out)
                    .map_err(bad_cipher)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key128() -> Vec<u8> {
        (0u8..16).collect()
    }

    fn iv() -> Vec<u8> {
        (100u8..116).collect()
    }

    #[test]
    fn roundtrip_block_aligned_plaintext() {
        let enc = AesCbcEncryptor::new(&key128()).expect("valid key length");
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
        let enc = AesCbcEncryptor::new(&key128()).expect("valid key length");
        let mut buf = vec![0u8; 17];
        assert!(enc.encrypt_in_place(&mut buf, &iv()).is_err());
    }

    #[test]
    fn rejects_bad_key_length() {
        assert!(AesCbcEncryptor::new(&[0u8; 20]).is_err());
    }

    #[test]
    fn accepts_all_three_key_sizes() {
        assert!(AesCbcEncryptor::new(&[0u8; 16]).is_ok());
        assert!(AesCbcEncryptor::new(&[0u8; 24]).is_ok());
        assert!(AesCbcEncryptor::new(&[0u8; 32]).is_ok());
    }

    #[test]
    fn decrypting_tampered_ciphertext_changes_plaintext() {
        let enc = AesCbcEncryptor::new(&key128()).expect("valid key length");
        let mut buf = vec![0u8; 32];
        enc.encrypt_in_place(&mut buf, &iv()).expect("encrypt");
        buf[0] ^= 0xFF;

        let mut plaintext = vec![0u8; buf.len()];
        enc.decrypt(&buf, &iv(), &mut plaintext).expect("decrypt does not itself detect tampering");
        assert_ne!(plaintext, vec![0u8; 32]);
    }
}
