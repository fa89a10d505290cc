//! Per-direction SA (security association) context: the primitive handles
//! plus the single mutable resource — sequence cursor on egress, anti-replay
//! window on ingress — serialized behind one per-SA lock, never a global
//! one (spec §5).

use std::sync::{Mutex, MutexGuard, PoisonError};

use esp_crypto::{Encryptor, Mac, SecureRandom};

use crate::replay::{ReplayWindow, SequenceCursor, DEFAULT_WINDOW_BITS};

/// An outbound (egress) SA: encrypts packets and hands out sequence
/// numbers in strictly ascending order.
pub struct OutboundSa {
    pub(crate) spi: u32,
    pub(crate) encryptor: Box<dyn Encryptor>,
    pub(crate) mac: Box<dyn Mac>,
    pub(crate) rng: Box<dyn SecureRandom>,
    cursor: Mutex<SequenceCursor>,
}

impl OutboundSa {
    pub fn new(
        spi: u32,
        encryptor: Box<dyn Encryptor>,
        mac: Box<dyn Mac>,
        rng: Box<dyn SecureRandom>,
    ) -> Self {
        Self { spi, encryptor, mac, rng, cursor: Mutex::new(SequenceCursor::new()) }
    }

    pub fn spi(&self) -> u32 {
        self.spi
    }

    /// Most recently issued sequence number (0 before the first encrypt).
    pub fn current_seqno(&self) -> u32 {
        self.cursor_guard().current()
    }

    pub(crate) fn cursor_guard(&self) -> MutexGuard<'_, SequenceCursor> {
        // A panic mid-encrypt must not poison every future packet on this
        // SA; recover the guard rather than propagating the poison.
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An inbound (ingress) SA: decrypts packets and enforces anti-replay via a
/// sliding window.
pub struct InboundSa {
    pub(crate) encryptor: Box<dyn Encryptor>,
    pub(crate) mac: Box<dyn Mac>,
    window: Mutex<ReplayWindow>,
}

impl InboundSa {
    pub fn new(encryptor: Box<dyn Encryptor>, mac: Box<dyn Mac>, window_bits: usize) -> Self {
        Self { encryptor, mac, window: Mutex::new(ReplayWindow::new(window_bits)) }
    }

    /// Construct with the default 64-bit anti-replay window.
    pub fn with_default_window(encryptor: Box<dyn Encryptor>, mac: Box<dyn Mac>) -> Self {
        Self::new(encryptor, mac, DEFAULT_WINDOW_BITS)
    }

    /// Highest sequence number accepted so far (0 before the first decrypt).
    pub fn highest_accepted(&self) -> u32 {
        self.window_guard().highest()
    }

    pub(crate) fn window_guard(&self) -> MutexGuard<'_, ReplayWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
