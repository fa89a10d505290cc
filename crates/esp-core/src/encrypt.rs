//! Encrypt pipeline (spec §4.3): inner IP packet + outbound SA → complete
//! ESP datagram. Step numbers in comments below match the spec's
//! contractual ordering.

use tracing::trace;
use zeroize::Zeroize;

use crate::header;
use crate::padding;
use crate::packet::EspPacket;
use crate::sa::OutboundSa;
use crate::wipe::wipe_buffer;
use crate::EspError;

/// Encrypt `packet`'s inner IP packet into a complete ESP datagram,
/// replacing its raw bytes in place.
pub fn encrypt(packet: &mut EspPacket, sa: &OutboundSa) -> Result<(), EspError> {
    let inner = packet
        .get_payload()
        .ok_or(EspError::Parse("packet has no inner IP packet to encrypt"))?;
    let payload = inner.encoding().to_vec();
    let next_header = inner.version().next_header_value();

    // Step 1: next sequence number, or FAILED if the cursor has cycled.
    let seq = sa.cursor_guard().next_seqno()?;

    // Step 2: query primitive sizes.
    let block_size = sa.encryptor.block_size();
    let iv_size = sa.encryptor.iv_size();
    let icv_size = sa.mac.icv_size();

    // Step 3: plaintext tail.
    let tail = padding::encode_tail(&payload, block_size, next_header);
    let plaintext_len = tail.len();

    // Step 4: one contiguous allocation for header + IV + ciphertext + ICV.
    let total_len = header::HEADER_LEN + iv_size + plaintext_len + icv_size;
    let mut buf = vec![0u8; total_len];

    if let Err(e) = fill_datagram(&mut buf, sa, seq, iv_size, plaintext_len, icv_size, &tail) {
        wipe_buffer(buf);
        return Err(e);
    }

    packet.set_raw(buf);
    trace!(spi = sa.spi(), seq, len = total_len, "encrypted ESP datagram");
    Ok(())
}

/// Steps 5-8: write header, fill IV, write ciphertext region, encrypt, MAC.
fn fill_datagram(
    buf: &mut [u8],
    sa: &OutboundSa,
    seq: u32,
    iv_size: usize,
    plaintext_len: usize,
    icv_size: usize,
    tail: &[u8],
) -> Result<(), EspError> {
    // Step 5a: SPI and sequence, big-endian, at offset 0.
    header::write_header(buf, sa.spi(), seq)?;

    let ct_start = header::HEADER_LEN + iv_size;
    let (head, rest) = buf.split_at_mut(ct_start);
    let iv = &mut head[header::HEADER_LEN..];

    // Step 5b: fill the IV region from the RNG. Reported as NOT_FOUND so
    // callers can distinguish "try again" from a hard cipher failure.
    sa.rng.fill(iv).map_err(|_| EspError::RngUnavailable)?;

    // Step 6: write the plaintext tail into the ciphertext region.
    let (ciphertext, icv_region) = rest.split_at_mut(plaintext_len);
    ciphertext.copy_from_slice(tail);

    // Step 7: encrypt in place using the just-written IV.
    sa.encryptor.encrypt_in_place(ciphertext, iv).map_err(EspError::Failed)?;

    // Step 8: MAC over header ‖ IV ‖ ciphertext; write the ICV.
    let mut icv = vec![0u8; icv_size];
    sa.mac.sign(&[&head[..], &ciphertext[..]], &mut icv).map_err(EspError::Failed)?;
    icv_region.copy_from_slice(&icv);
    icv.zeroize();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inner_packet::InnerIpPacket;
    use esp_crypto::{AesCbcEncryptor, HmacMac, OsRandom};

    fn addr(port: u16) -> std::net::SocketAddr {
        ([127, 0, 0, 1], port).into()
    }

    fn sa(spi: u32) -> OutboundSa {
        OutboundSa::new(
            spi,
            Box::new(AesCbcEncryptor::new(&[7u8; 16]).expect("key")),
            Box::new(HmacMac::sha256(b"0123456789abcdef", 12).expect("mac")),
            Box::new(OsRandom),
        )
    }

    #[test]
    fn produces_expected_layout() {
        let inner = InnerIpPacket::from_bytes(vec![0x45; 20]).expect("ipv4");
        let mut packet = EspPacket::from_inner(addr(1), addr(2), inner);
        let outbound = sa(0xDEAD_BEEF);

        encrypt(&mut packet, &outbound).expect("encrypt");

        // S1: 8 header + 16 iv + 32 ciphertext (20 payload rounds to 32) + 12 icv = 68.
        assert_eq!(packet.raw().len(), 8 + 16 + 32 + 12);
        assert_eq!(outbound.current_seqno(), 1);
    }

    #[test]
    fn sequence_increments_per_packet() {
        let outbound = sa(1);
        for expected in 1..=3u32 {
            let inner = InnerIpPacket::from_bytes(vec![0x45; 20]).expect("ipv4");
            let mut packet = EspPacket::from_inner(addr(1), addr(2), inner);
            encrypt(&mut packet, &outbound).expect("encrypt");
            assert_eq!(outbound.current_seqno(), expected);
        }
    }

    #[test]
    fn rejects_packet_without_inner() {
        let mut packet = EspPacket::from_datagram(addr(1), addr(2), vec![]);
        let outbound = sa(1);
        assert!(matches!(encrypt(&mut packet, &outbound), Err(EspError::Parse(_))));
    }
}
