//! Anti-replay window and egress sequence cursor (spec §4.6).
//!
//! The window is a fixed-size bitmap plus a scalar high-water mark, stored
//! as 64-bit words with no dynamic allocation after construction. Bit
//! position `p` (counting from word 0, bit 0 upward) represents the
//! sequence number `highest - p`; position 0 is always the current
//! highest. Growing `highest` is therefore a left shift of the whole
//! bit-array (in the little-endian-word sense: word 0 holds the least
//! significant bits).

use crate::EspError;

/// Default window width in bits — the "typical minimum" per spec §4.6.
pub const DEFAULT_WINDOW_BITS: usize = 64;

/// Sliding bitmap of recently-accepted sequence numbers for a single
/// unidirectional SA.
#[derive(Debug)]
pub struct ReplayWindow {
    highest: u32,
    words: Vec<u64>,
    window_bits: usize,
}

impl ReplayWindow {
    /// Create a window with `window_bits` bits of history. `window_bits`
    /// must be a positive multiple of 64 (64, 128, 256, 512, ...).
    pub fn new(window_bits: usize) -> Self {
        assert!(
            window_bits > 0 && window_bits % 64 == 0,
            "window_bits must be a positive multiple of 64"
        );
        Self { highest: 0, words: vec![0u64; window_bits / 64], window_bits }
    }

    /// Width of the window in bits.
    pub fn window_bits(&self) -> usize {
        self.window_bits
    }

    /// Highest sequence number accepted so far; 0 means "no packet accepted
    /// yet".
    pub fn highest(&self) -> u32 {
        self.highest
    }

    /// `true` iff `seq` would be accepted: non-zero, and either beyond the
    /// current high-water mark or within the window with its bit still
    /// clear. Does not mutate state.
    pub fn check(&self, seq: u32) -> bool {
        if seq == 0 {
            return false;
        }
        if seq > self.highest {
            return true;
        }
        let diff = (self.highest - seq) as usize;
        diff < self.window_bits && !self.bit_set(diff)
    }

    /// Commit `seq` into the window. Precondition: `check(seq)` most
    /// recently returned `true` for this `seq`, with no intervening commit
    /// for the same SA.
    pub fn commit(&mut self, seq: u32) {
        if seq > self.highest {
            let shift = (seq - self.highest) as usize;
            self.shift_left(shift);
            self.highest = seq;
            self.set_bit(0);
        } else {
            let diff = (self.highest - seq) as usize;
            self.set_bit(diff);
        }
    }

    fn bit_set(&self, pos: usize) -> bool {
        let word = pos / 64;
        let bit = pos % 64;
        (self.words[word] >> bit) & 1 == 1
    }

    fn set_bit(&mut self, pos: usize) {
        let word = pos / 64;
        let bit = pos % 64;
        self.words[word] |= 1u64 << bit;
    }

    /// Multi-word left shift (word 0 is least significant); bits shifted
    /// past the top word are discarded.
    fn shift_left(&mut self, shift: usize) {
        let n = self.words.len();
        if shift >= self.window_bits {
            self.words.iter_mut().for_each(|w| *w = 0);
            return;
        }
        let word_shift = shift / 64;
        let bit_shift = shift % 64;

        for i in (0..n).rev() {
            let src = if i >= word_shift { self.words[i - word_shift] } else { 0 };
            let mut new_word = if bit_shift == 0 { src } else { src << bit_shift };
            if bit_shift > 0 && i >= word_shift + 1 {
                new_word |= self.words[i - word_shift - 1] >> (64 - bit_shift);
            }
            self.words[i] = new_word;
        }
    }
}

/// Egress sequence-number cursor for an outbound SA.
#[derive(Debug, Default)]
pub struct SequenceCursor {
    highest: u32,
}

impl SequenceCursor {
    pub fn new() -> Self {
        Self { highest: 0 }
    }

    /// Issue the next sequence number. Returns
    /// `Err(EspError::SequenceCycled)` once the 32-bit space is exhausted;
    /// the caller must tear down and rekey the SA — this core does not
    /// attempt that itself.
    pub fn next_seqno(&mut self) -> Result<u32, EspError> {
        if self.highest == u32::MAX {
            return Err(EspError::SequenceCycled);
        }
        self.highest += 1;
        Ok(self.highest)
    }

    /// The most recently issued sequence number (0 before the first call
    /// to `next_seqno`).
    pub fn current(&self) -> u32 {
        self.highest
    }
}
