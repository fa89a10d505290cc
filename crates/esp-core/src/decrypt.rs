//! Decrypt pipeline (spec §4.4): received ESP datagram + inbound SA →
//! inner IP packet, with anti-replay enforced by a strict pre-check/commit
//! split. Step numbers in comments below match the spec's contractual
//! ordering; any step's failure aborts the remaining steps.

use tracing::{trace, warn};

use crate::header;
use crate::inner_packet::InnerIpPacket;
use crate::packet::EspPacket;
use crate::padding;
use crate::sa::InboundSa;
use crate::wipe::wipe_buffer;
use crate::EspError;

/// Decrypt `packet`'s raw datagram against `sa`, populating its decoded
/// inner IP packet and next-header on success.
pub fn decrypt(packet: &mut EspPacket, sa: &InboundSa) -> Result<(), EspError> {
    let datagram = packet.raw();

    // Step 1: parse the fixed header.
    let (spi, seq) = header::read_header(datagram)?;

    let block_size = sa.encryptor.block_size();
    let iv_size = sa.encryptor.iv_size();
    let icv_size = sa.mac.icv_size();

    // Step 2: length checks.
    let datagram_len = datagram.len();
    let min_len = header::HEADER_LEN + iv_size + icv_size + block_size;
    if datagram_len < min_len {
        return Err(EspError::Parse("datagram shorter than the minimum ESP layout"));
    }
    let ciphertext_len = datagram_len - header::HEADER_LEN - iv_size - icv_size;
    if ciphertext_len % block_size != 0 {
        return Err(EspError::Parse("ciphertext length is not a multiple of the block size"));
    }

    // Step 3: split slices.
    let iv_start = header::HEADER_LEN;
    let ct_start = iv_start + iv_size;
    let ct_end = ct_start + ciphertext_len;

    let header_bytes = &datagram[..header::HEADER_LEN];
    let iv = &datagram[iv_start..ct_start];
    let ciphertext = &datagram[ct_start..ct_end];
    let icv = &datagram[ct_end..ct_end + icv_size];

    // Steps 4 and 9 form one critical section: the window's mutex is taken
    // once here and held across MAC verification, decryption, and tail/inner
    // decode, all the way to the commit at step 9. Two concurrent decrypts
    // against the same SA must not both observe `check` succeed for the
    // same seq before either commits — that would let a forged or replayed
    // packet race a legitimate one past the window (spec §4.6, §5).
    let mut window = sa.window_guard();

    // Step 4: anti-replay pre-check. Nothing else is touched on failure.
    if !window.check(seq) {
        warn!(spi, seq, "ESP datagram rejected by the anti-replay window");
        return Err(EspError::Replay);
    }

    // Step 5: MAC verification, constant-time, over header ‖ IV ‖ ciphertext.
    if sa.mac.verify(&[header_bytes, iv, ciphertext], icv).is_err() {
        warn!(spi, seq, "ESP datagram failed MAC verification");
        return Err(EspError::Failed(esp_crypto::PrimitiveError::IcvMismatch));
    }

    // Step 6: decrypt.
    let mut plaintext = vec![0u8; ciphertext_len];
    if let Err(e) = sa.encryptor.decrypt(ciphertext, iv, &mut plaintext) {
        wipe_buffer(plaintext);
        return Err(EspError::Failed(e));
    }

    // Step 7: strip padding (decode_tail wipes plaintext itself on failure).
    let (payload, next_header) = padding::decode_tail(plaintext)?;

    // Step 8: decode the inner IP packet (from_bytes wipes on failure).
    let inner = InnerIpPacket::from_bytes(payload)?;

    // Step 9: commit, only now that every prior step has succeeded, still
    // under the same guard acquired at step 4.
    window.commit(seq);

    packet.set_decoded(inner, next_header);
    trace!(spi, seq, "decrypted ESP datagram");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encrypt::encrypt;
    use crate::inner_packet::InnerIpPacket;
    use crate::sa::OutboundSa;
    use esp_crypto::{AesCbcEncryptor, HmacMac, OsRandom};

    fn addr(port: u16) -> std::net::SocketAddr {
        ([127, 0, 0, 1], port).into()
    }

    fn key() -> [u8; 16] {
        [7u8; 16]
    }

    fn mac_key() -> &'static [u8] {
        b"0123456789abcdef"
    }

    fn outbound_sa(spi: u32) -> OutboundSa {
        OutboundSa::new(
            spi,
            Box::new(AesCbcEncryptor::new(&key()).expect("key")),
            Box::new(HmacMac::sha256(mac_key(), 12).expect("mac")),
            Box::new(OsRandom),
        )
    }

    fn inbound_sa() -> InboundSa {
        InboundSa::with_default_window(
            Box::new(AesCbcEncryptor::new(&key()).expect("key")),
            Box::new(HmacMac::sha256(mac_key(), 12).expect("mac")),
        )
    }

    #[test]
    fn round_trip_recovers_payload_and_next_header() {
        let payload = vec![0x45u8; 20];
        let inner = InnerIpPacket::from_bytes(payload.clone()).expect("ipv4");
        let mut egress = EspPacket::from_inner(addr(1), addr(2), inner);

        let out_sa = outbound_sa(0xDEAD_BEEF);
        encrypt(&mut egress, &out_sa).expect("encrypt");

        let in_sa = inbound_sa();
        let mut ingress = EspPacket::from_datagram(addr(2), addr(1), egress.raw().to_vec());
        decrypt(&mut ingress, &in_sa).expect("decrypt");

        assert_eq!(ingress.get_next_header(), Some(4));
        assert_eq!(ingress.get_payload().expect("payload").encoding(), payload.as_slice());
    }

    #[test]
    fn replay_of_identical_datagram_is_rejected() {
        let inner = InnerIpPacket::from_bytes(vec![0x45u8; 20]).expect("ipv4");
        let mut egress = EspPacket::from_inner(addr(1), addr(2), inner);
        let out_sa = outbound_sa(1);
        encrypt(&mut egress, &out_sa).expect("encrypt");

        let in_sa = inbound_sa();
        let mut first = EspPacket::from_datagram(addr(2), addr(1), egress.raw().to_vec());
        decrypt(&mut first, &in_sa).expect("first decrypt");
        assert_eq!(in_sa.highest_accepted(), 1);

        let mut replay = EspPacket::from_datagram(addr(2), addr(1), egress.raw().to_vec());
        assert!(matches!(decrypt(&mut replay, &in_sa), Err(EspError::Replay)));
        assert_eq!(in_sa.highest_accepted(), 1);
    }

    #[test]
    fn tampered_icv_is_rejected_and_window_unchanged() {
        let inner = InnerIpPacket::from_bytes(vec![0x45u8; 20]).expect("ipv4");
        let mut egress = EspPacket::from_inner(addr(1), addr(2), inner);
        let out_sa = outbound_sa(1);
        encrypt(&mut egress, &out_sa).expect("encrypt");

        let mut tampered = egress.raw().to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0xFF;

        let in_sa = inbound_sa();
        let mut packet = EspPacket::from_datagram(addr(2), addr(1), tampered);
        assert!(matches!(
            decrypt(&mut packet, &in_sa),
            Err(EspError::Failed(esp_crypto::PrimitiveError::IcvMismatch))
        ));
        assert_eq!(in_sa.highest_accepted(), 0);
    }

    #[test]
    fn mac_invalid_high_sequence_does_not_advance_window() {
        // Property 7: commit-after-verify. A MAC-invalid packet far ahead in
        // the sequence space must not move `highest`, so a legitimate
        // follow-up packet is still accepted afterward.
        let in_sa = inbound_sa();
        let out_sa = outbound_sa(1);

        let first_inner = InnerIpPacket::from_bytes(vec![0x45u8; 20]).expect("ipv4");
        let mut first = EspPacket::from_inner(addr(1), addr(2), first_inner);
        encrypt(&mut first, &out_sa).expect("encrypt first");
        let mut first_in = EspPacket::from_datagram(addr(2), addr(1), first.raw().to_vec());
        decrypt(&mut first_in, &in_sa).expect("decrypt first");
        assert_eq!(in_sa.highest_accepted(), 1);

        // Forge a packet whose header sequence is far ahead, with a broken ICV.
        let mut forged = first.raw().to_vec();
        let seq_offset = 4;
        forged[seq_offset..seq_offset + 4].copy_from_slice(&11u32.to_be_bytes());
        let last = forged.len() - 1;
        forged[last] ^= 0xFF;
        let mut forged_packet = EspPacket::from_datagram(addr(2), addr(1), forged);
        assert!(decrypt(&mut forged_packet, &in_sa).is_err());
        assert_eq!(in_sa.highest_accepted(), 1);

        // A legitimate seq=2 packet (from the same outbound SA) is still accepted.
        let second_inner = InnerIpPacket::from_bytes(vec![0x45u8; 20]).expect("ipv4");
        let mut second = EspPacket::from_inner(addr(1), addr(2), second_inner);
        encrypt(&mut second, &out_sa).expect("encrypt second");
        let mut second_in = EspPacket::from_datagram(addr(2), addr(1), second.raw().to_vec());
        decrypt(&mut second_in, &in_sa).expect("decrypt second");
        assert_eq!(in_sa.highest_accepted(), 2);
    }

    #[test]
    fn bad_padding_is_reported_as_parse_error() {
        // Scenario S6: craft ciphertext that decrypts to plaintext with
        // tampered pad bytes by tampering a ciphertext block directly (CBC
        // propagates the change into the decrypted pad region).
        let inner = InnerIpPacket::from_bytes(vec![0x45u8; 20]).expect("ipv4");
        let mut egress = EspPacket::from_inner(addr(1), addr(2), inner);
        let out_sa = outbound_sa(1);
        encrypt(&mut egress, &out_sa).expect("encrypt");

        // Re-sign after corrupting a ciphertext byte so the MAC still
        // verifies and padding validation is what actually fails.
        let mac = HmacMac::sha256(mac_key(), 12).expect("mac");

        let mut raw = egress.raw().to_vec();
        let icv_start = raw.len() - 12;
        let ct_end = icv_start;
        raw[ct_end - 1] ^= 0x01; // corrupt the last ciphertext byte (pad-length/next-header block)

        let (head_and_ct, icv_region) = raw.split_at_mut(ct_end);
        let mut icv = vec![0u8; 12];
        mac.sign(&[head_and_ct], &mut icv).expect("resign");
        icv_region.copy_from_slice(&icv);

        let in_sa = inbound_sa();
        let mut packet = EspPacket::from_datagram(addr(2), addr(1), raw);
        assert!(matches!(decrypt(&mut packet, &in_sa), Err(EspError::Parse(_))));
    }
}
