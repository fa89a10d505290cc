//! Packet container (spec §4.5): carries source/destination endpoints, raw
//! datagram bytes, and — after a successful decrypt — the decoded inner IP
//! packet and next-header byte.

use std::net::SocketAddr;

use zeroize::Zeroize;

use crate::inner_packet::InnerIpPacket;

/// An ESP datagram in flight through a pipeline.
///
/// Ownership is exclusive: whichever pipeline function is handed this
/// container mutates it in place and does not retain aliases into its
/// buffers after returning.
#[derive(Debug, Clone)]
pub struct EspPacket {
    source: SocketAddr,
    destination: SocketAddr,
    raw: Vec<u8>,
    inner: Option<InnerIpPacket>,
    next_header: Option<u8>,
}

impl EspPacket {
    /// Build a packet from a received datagram, ready for the decrypt
    /// pipeline.
    pub fn from_datagram(source: SocketAddr, destination: SocketAddr, raw: Vec<u8>) -> Self {
        Self { source, destination, raw, inner: None, next_header: None }
    }

    /// Build a packet from an inner IP packet, ready for the encrypt
    /// pipeline. The raw buffer starts empty; `encrypt` populates it.
    pub fn from_inner(source: SocketAddr, destination: SocketAddr, inner: InnerIpPacket) -> Self {
        Self {
            source,
            destination,
            raw: Vec::new(),
            next_header: Some(inner.version().next_header_value()),
            inner: Some(inner),
        }
    }

    pub fn source(&self) -> SocketAddr {
        self.source
    }

    pub fn set_source(&mut self, source: SocketAddr) {
        self.source = source;
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn set_destination(&mut self, destination: SocketAddr) {
        self.destination = destination;
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn set_raw(&mut self, raw: Vec<u8>) {
        self.raw = raw;
    }

    /// Drop the first `n` bytes of the raw buffer, e.g. to skip an
    /// encapsulating UDP/NAT-T header before the ESP datagram starts.
    pub fn skip_prefix(&mut self, n: usize) {
        let n = n.min(self.raw.len());
        self.raw.drain(0..n);
    }

    /// The next-header byte: populated on successful decrypt, or derived
    /// from the inner packet's version when constructed for encrypt.
    pub fn get_next_header(&self) -> Option<u8> {
        self.next_header
    }

    pub(crate) fn set_decoded(&mut self, inner: InnerIpPacket, next_header: u8) {
        self.inner = Some(inner);
        self.next_header = Some(next_header);
    }

    /// Borrow the decoded inner packet. `None` before a successful decrypt.
    pub fn get_payload(&self) -> Option<&InnerIpPacket> {
        self.inner.as_ref()
    }

    /// Take ownership of the decoded inner packet, leaving the container
    /// pointing at none.
    pub fn extract_payload(&mut self) -> Option<InnerIpPacket> {
        self.inner.take()
    }

    /// Wipe any buffer that might hold plaintext and drop the container.
    pub fn destroy(mut self) {
        self.raw.zeroize();
        self.inner = None;
    }
}
