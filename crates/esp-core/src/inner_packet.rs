//! The inner IP packet collaborator (spec §6): a minimal container
//! exposing just enough surface for the ESP pipelines — its wire encoding
//! and IP version. Full IPv4/IPv6 parsing is out of scope for this core;
//! the caller that does route/policy lookup is expected to hand the
//! pipeline an already-validated packet.

use zeroize::Zeroize;

use crate::EspError;

/// IANA protocol number used as the ESP next-header byte for this version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// The next-header value ESP uses to tag this inner packet's protocol
    /// (4 = IP-in-IP/IPv4, 41 = IPv6 encapsulation).
    pub const fn next_header_value(self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 41,
        }
    }
}

/// A minimal inner IP packet: its raw encoding plus the version derived
/// from the first nibble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerIpPacket {
    version: IpVersion,
    bytes: Vec<u8>,
}

impl InnerIpPacket {
    /// Build from raw bytes, validating the version nibble in the first
    /// byte (4 for IPv4, 6 for IPv6). On failure the bytes are wiped.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self, EspError> {
        let first = match bytes.first() {
            Some(&b) => b,
            None => {
                bytes.zeroize();
                return Err(EspError::Parse("empty inner IP packet"));
            }
        };
        let version = match first >> 4 {
            4 => IpVersion::V4,
            6 => IpVersion::V6,
            _ => {
                bytes.zeroize();
                return Err(EspError::Parse("unrecognised inner IP version"));
            }
        };
        Ok(Self { version, bytes })
    }

    pub fn version(&self) -> IpVersion {
        self.version
    }

    pub fn encoding(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
