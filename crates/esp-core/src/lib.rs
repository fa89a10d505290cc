//! # esp-core
//!
//! The ESP (Encapsulating Security Payload) datagram engine: encrypts a
//! plaintext inner IP packet plus a unidirectional SA context into an
//! authenticated ESP datagram (RFC 4303, encrypt-then-MAC composition with
//! separate cipher and MAC primitives), and reverses that on ingress while
//! enforcing anti-replay via a sliding window.
//!
//! SA negotiation, key derivation, socket I/O, NAT traversal, routing and
//! policy lookup, kernel offload, and configuration are external
//! collaborators' concerns — this crate only implements the datagram
//! transform itself. Concrete cipher/MAC/RNG implementations live in
//! [`esp_crypto`]; this crate is generic over their trait objects.

mod decrypt;
mod encrypt;
mod header;
mod inner_packet;
mod packet;
mod padding;
mod replay;
mod sa;
mod wipe;

pub use decrypt::decrypt;
pub use encrypt::encrypt;
pub use header::HEADER_LEN;
pub use inner_packet::{InnerIpPacket, IpVersion};
pub use packet::EspPacket;
pub use replay::{ReplayWindow, SequenceCursor, DEFAULT_WINDOW_BITS};
pub use sa::{InboundSa, OutboundSa};

/// Failures a pipeline function can return. Mirrors the four failure kinds
/// an ESP engine must distinguish for callers; success is the absence of an
/// error (`Ok(())`).
#[derive(Debug, thiserror::Error)]
pub enum EspError {
    /// Malformed header, impossible length, bad padding, or an
    /// unrecognised inner IP version.
    #[error("malformed ESP datagram: {0}")]
    Parse(&'static str),

    /// Sequence number rejected by the anti-replay window: outside the
    /// acceptable range, or already seen.
    #[error("sequence number rejected by the anti-replay window")]
    Replay,

    /// MAC mismatch, or an encryptor/decryptor/RNG primitive failure.
    #[error("ESP pipeline failed: {0}")]
    Failed(#[source] esp_crypto::PrimitiveError),

    /// The egress sequence cursor has exhausted the 32-bit space; the
    /// caller must tear down and rekey the SA.
    #[error("sequence number space exhausted; the SA must be rekeyed")]
    SequenceCycled,

    /// The RNG was unavailable while filling a per-packet IV, reported
    /// distinctly from other primitive failures so a caller can retry.
    #[error("random number generator unavailable")]
    RngUnavailable,
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, EspError>;
