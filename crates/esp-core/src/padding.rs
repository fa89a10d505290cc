//! RFC-4303 self-describing ESP trailer: payload, pad bytes, pad length,
//! next header (spec §3, §4.2).

use crate::wipe::wipe_buffer;
use crate::EspError;

/// Build the plaintext tail: `payload ‖ 1,2,…,pad_length ‖ pad_length ‖
/// next_header`, with `pad_length` chosen so the result is a multiple of
/// `block_size` (1 ≤ pad_length ≤ block_size).
pub fn encode_tail(payload: &[u8], block_size: usize, next_header: u8) -> Vec<u8> {
    debug_assert!(block_size > 0 && block_size <= 256, "block size out of range for a 1-byte pad count");
    let remainder = (payload.len() + 2) % block_size;
    let pad_length = block_size - remainder;

    let mut tail = Vec::with_capacity(payload.len() + pad_length + 2);
    tail.extend_from_slice(payload);
    for i in 1..=pad_length {
        tail.push(i as u8);
    }
    tail.push(pad_length as u8);
    tail.push(next_header);
    tail
}

/// Strip and validate the tail, returning `(payload, next_header)`. On any
/// failure the plaintext buffer is wiped before the error is returned
/// (spec §4.2, §7).
pub fn decode_tail(plaintext: Vec<u8>) -> Result<(Vec<u8>, u8), EspError> {
    let len = plaintext.len();
    if len < 2 {
        wipe_buffer(plaintext);
        return Err(EspError::Parse("plaintext shorter than the ESP trailer"));
    }

    let next_header = plaintext[len - 1];
    let pad_length = plaintext[len - 2] as usize;
    if pad_length + 2 > len {
        wipe_buffer(plaintext);
        return Err(EspError::Parse("pad length exceeds plaintext length"));
    }

    let payload_len = len - 2 - pad_length;
    let pad_region = &plaintext[payload_len..len - 2];
    for (i, &b) in pad_region.iter().enumerate() {
        if b as usize != i + 1 {
            wipe_buffer(plaintext);
            return Err(EspError::Parse("pad bytes do not follow the 1..pad_length pattern"));
        }
    }

    let payload = plaintext[..payload_len].to_vec();
    wipe_buffer(plaintext);
    Ok((payload, next_header))
}
