//! Fixed 8-byte ESP header: SPI and sequence number, both big-endian
//! (spec §4.1).

use crate::EspError;

/// Length in bytes of the fixed ESP header (SPI + sequence number).
pub const HEADER_LEN: usize = 8;

/// Write `spi` and `seq` big-endian into the first 8 bytes of `buf`.
pub fn write_header(buf: &mut [u8], spi: u32, seq: u32) -> Result<(), EspError> {
    if buf.len() < HEADER_LEN {
        return Err(EspError::Parse("buffer too small for ESP header"));
    }
    buf[0..4].copy_from_slice(&spi.to_be_bytes());
    buf[4..8].copy_from_slice(&seq.to_be_bytes());
    Ok(())
}

/// Read `(spi, seq)` from the first 8 bytes of `buf`.
pub fn read_header(buf: &[u8]) -> Result<(u32, u32), EspError> {
    if buf.len() < HEADER_LEN {
        return Err(EspError::Parse("datagram shorter than the ESP header"));
    }
    let spi = u32::from_be_bytes(buf[0..4].try_into().expect("slice is exactly 4 bytes"));
    let seq = u32::from_be_bytes(buf[4..8].try_into().expect("slice is exactly 4 bytes"));
    Ok((spi, seq))
}
