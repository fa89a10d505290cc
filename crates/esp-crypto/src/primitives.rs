//! Opaque capability-handle traits for the ESP engine's collaborator
//! primitives: an encryptor, a MAC, and a random byte source. Each is a
//! small value type exposing only the operations its pipeline needs;
//! polymorphism is by the capability set (a trait object), not inheritance.

/// Block cipher capability used for the ESP ciphertext region.
///
/// Implementations must support in-place encryption and must not add any
/// padding of their own — the ESP padding codec already aligns the
/// plaintext to `block_size()` before either method is called.
pub trait Encryptor: Send + Sync {
    /// Cipher block size in bytes. Ciphertext length is always a multiple
    /// of this.
    fn block_size(&self) -> usize;

    /// IV size in bytes for this cipher.
    fn iv_size(&self) -> usize;

    /// Encrypt `buf` in place using `iv`. `buf.len()` must be a multiple of
    /// `block_size()` and `iv.len()` must equal `iv_size()`.
    fn encrypt_in_place(&self, buf: &mut [u8], iv: &[u8]) -> Result<(), PrimitiveError>;

    /// Decrypt `ciphertext` into `plaintext_out`, which must have the same
    /// length, using `iv`.
    fn decrypt(
        &self,
        ciphertext: &[u8],
        iv: &[u8],
        plaintext_out: &mut [u8],
    ) -> Result<(), PrimitiveError>;
}

/// MAC capability used to authenticate the ESP header, IV, and ciphertext.
pub trait Mac: Send + Sync {
    /// ICV length in bytes produced by this MAC.
    fn icv_size(&self) -> usize;

    /// Compute the MAC over the logical concatenation of `data` and write
    /// it to `out`. `out.len()` must equal `icv_size()`.
    fn sign(&self, data: &[&[u8]], out: &mut [u8]) -> Result<(), PrimitiveError>;

    /// Verify `icv` against the MAC of the logical concatenation of `data`.
    /// Implementations must compare in constant time and must never
    /// short-circuit on the first differing byte.
    fn verify(&self, data: &[&[u8]], icv: &[u8]) -> Result<(), PrimitiveError>;
}

/// Random byte source used to fill per-packet IVs.
pub trait SecureRandom: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), PrimitiveError>;
}

/// Failure from a collaborator primitive (cipher, MAC, or RNG).
#[derive(Debug, thiserror::Error)]
pub enum PrimitiveError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("buffer length is not a multiple of the cipher block size")]
    InvalidBlockAlignment,

    #[error("cipher operation failed")]
    CipherFailure,

    #[error("MAC output buffer has the wrong length: expected {expected}, got {actual}")]
    InvalidMacBufferLength { expected: usize, actual: usize },

    #[error("requested ICV length {requested} exceeds the digest output size {max}")]
    IcvTooLong { requested: usize, max: usize },

    #[error("ICV verification failed")]
    IcvMismatch,

    #[error("random number generator failed: {0}")]
    RngFailure(String),
}
