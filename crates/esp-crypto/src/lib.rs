//! # esp-crypto
//!
//! Concrete implementations of the ESP engine's collaborator primitives: a
//! block-cipher [`Encryptor`], a MAC, and a [`SecureRandom`] byte source.
//! Algorithm *negotiation* is out of scope (that belongs to IKE); this
//! crate only supplies algorithms an SA context can be built from, and the
//! traits an engine can be generic over instead of naming a concrete
//! algorithm.

mod aes_cbc;
mod des_cbc;
mod hmac_mac;
mod primitives;
mod rng;

pub use aes_cbc::AesCbcEncryptor;
pub use des_cbc::DesCbcEncryptor;
pub use hmac_mac::HmacMac;
pub use primitives::{Encryptor, Mac, PrimitiveError, SecureRandom};
pub use rng::OsRandom;
