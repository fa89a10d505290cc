//! OS-backed random byte source, the only `SecureRandom` implementation
//! shipped in this crate. Algorithm negotiation and deterministic test RNGs
//! are a caller's concern.

use rand::{rngs::OsRng, RngCore};

use crate::primitives::{PrimitiveError, SecureRandom};

/// Fills buffers from the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), PrimitiveError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| PrimitiveError::RngFailure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_buffer_without_error() {
        let rng = OsRandom;
        let mut buf = [0u8; 32];
        rng.fill(&mut buf).expect("OS RNG should not fail");
        assert!(buf.iter().any(|&b| b != 0));
    }

    #[test]
    fn two_fills_are_not_identical() {
        let rng = OsRandom;
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        rng.fill(&mut a).expect("fill a");
        rng.fill(&mut b).expect("fill b");
        assert_ne!(a, b);
    }
}
