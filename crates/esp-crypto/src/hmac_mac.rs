//! HMAC-based MAC: HMAC over a configurable digest (SHA-256 or SHA-512),
//! truncated to a negotiated ICV length, with constant-time verification.

use hmac::{Hmac, Mac as HmacTraitMac};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::primitives::{Mac, PrimitiveError};

enum HmacKey {
    Sha256(Vec<u8>),
    Sha512(Vec<u8>),
}

impl Drop for HmacKey {
    fn drop(&mut self) {
        match self {
            HmacKey::Sha256(k) => k.zeroize(),
            HmacKey::Sha512(k) => k.zeroize(),
        }
    }
}

/// HMAC-SHA256 or HMAC-SHA512, truncated to `icv_len` bytes (e.g. 12 bytes
/// for an HMAC-SHA-256-96 profile).
pub struct HmacMac {
    key: HmacKey,
    icv_len: usize,
}

impl HmacMac {
    /// HMAC-SHA256, truncated to `icv_len` bytes (1..=32).
    pub fn sha256(key: &[u8], icv_len: usize) -> Result<Self, PrimitiveError> {
        if icv_len == 0 || icv_len > 32 {
            return Err(PrimitiveError::IcvTooLong { requested: icv_len, max: 32 });
        }
        Ok(Self { key: HmacKey::Sha256(key.to_vec()), icv_len })
    }

    /// HMAC-SHA512, truncated to `icv_len` bytes (1..=64).
    pub fn sha512(key: &[u8], icv_len: usize) -> Result<Self, PrimitiveError> {
        if icv_len == 0 || icv_len > 64 {
            return Err(PrimitiveError::IcvTooLong { requested: icv_len, max: 64 });
        }
        Ok(Self { key: HmacKey::Sha512(key.to_vec()), icv_len })
    }

    fn compute(&self, data: &[&[u8]]) -> Result<Vec<u8>, PrimitiveError> {
        match &self.key {
            HmacKey::Sha256(k) => {
                let mut mac = Hmac::<Sha256>::new_from_slice(k)
                    .map_err(|_| PrimitiveError::InvalidKeyLength { expected: 32, actual: k.len() })?;
                for chunk in data {
                    HmacTraitMac::update(&mut mac, chunk);
                }
                Ok(HmacTraitMac::finalize(mac).into_bytes().to_vec())
            }
            HmacKey::Sha512(k) => {
                let mut mac = Hmac::<Sha512>::new_from_slice(k)
                    .map_err(|_| PrimitiveError::InvalidKeyLength { expected: 64, actual: k.len() })?;
                for chunk in data {
                    HmacTraitMac::update(&mut mac, chunk);
                }
                Ok(HmacTraitMac::finalize(mac).into_bytes().to_vec())
            }
        }
    }
}

impl Mac for HmacMac {
    fn icv_size(&self) -> usize {
        self.icv_len
    }

    fn sign(&self, data: &[&[u8]], out: &mut [u8]) -> Result<(), PrimitiveError> {
        if out.len() != self.icv_len {
            return Err(PrimitiveError::InvalidMacBufferLength {
                expected: self.icv_len,
                actual: out.len(),
            });
        }
        let full = self.compute(data)?;
        out.copy_from_slice(&full[..self.icv_len]);
        Ok(())
    }

    fn verify(&self, data: &[&[u8]], icv: &[u8]) -> Result<(), PrimitiveError> {
        if icv.len() != self.icv_len {
            return Err(PrimitiveError::IcvMismatch);
        }
        let full = self.compute(data)?;
        let matches: bool = full[..self.icv_len].ct_eq(icv).into();
        if matches {
            Ok(())
        } else {
            Err(PrimitiveError::IcvMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let mac = HmacMac::sha256(b"0123456789abcdef", 12).expect("valid params");
        let mut icv = vec![0u8; 12];
        mac.sign(&[b"header", b"iv", b"ciphertext"], &mut icv).expect("sign");
        mac.verify(&[b"header", b"iv", b"ciphertext"], &icv).expect("verify");
    }

    #[test]
    fn verify_rejects_tampered_data() {
        let mac = HmacMac::sha256(b"0123456789abcdef", 16).expect("valid params");
        let mut icv = vec![0u8; 16];
        mac.sign(&[b"header", b"ciphertext"], &mut icv).expect("sign");
        assert!(mac.verify(&[b"header", b"tampered!!"], &icv).is_err());
    }

    #[test]
    fn sign_over_split_slices_matches_sign_over_concatenation() {
        let mac = HmacMac::sha256(b"0123456789abcdef", 32).expect("valid params");
        let mut split = vec![0u8; 32];
        let mut whole = vec![0u8; 32];
        mac.sign(&[b"abc", b"def"], &mut split).expect("sign split");
        mac.sign(&[b"abcdef"], &mut whole).expect("sign whole");
        assert_eq!(split, whole);
    }

    #[test]
    fn icv_too_long_is_rejected_at_construction() {
        assert!(HmacMac::sha256(b"key", 33).is_err());
        assert!(HmacMac::sha512(b"key", 65).is_err());
    }

    #[test]
    fn verify_rejects_wrong_length_icv() {
        let mac = HmacMac::sha256(b"0123456789abcdef", 12).expect("valid params");
        assert!(mac.verify(&[b"data"], &[0u8; 11]).is_err());
    }
}
