//! Secure-erase helper for buffers that transiently held plaintext, IV, or
//! key-derived scratch data. Used explicitly on failure paths rather than
//! relied on only via `Drop`, since a caller may hold the packet container
//! alive (e.g. in a buffer pool) well past the point a pipeline step fails.

use zeroize::Zeroize;

/// Overwrite and truncate an owned buffer so the optimizer cannot elide the
/// write and no plaintext survives past a failed pipeline step.
pub(crate) fn wipe_buffer(mut buf: Vec<u8>) {
    buf.zeroize();
}
