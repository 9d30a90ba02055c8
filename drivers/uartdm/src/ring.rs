//! Fixed-capacity receive buffer.

use core::fmt;

use planck_noalloc::ringbuf::RingBuf;
use uartdm_driver_api::RxSink;

/// Receive buffer backed by a ring of `N` slots (capacity `N - 1`).
///
/// Overruns are latched until read with [`take_overrun`](Self::take_overrun).
pub struct RxRing<const N: usize> {
    buf: RingBuf<u8, N>,
    overrun: bool,
}

impl<const N: usize> RxRing<N> {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: RingBuf::new(),
            overrun: false,
        }
    }

    /// Removes the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        self.buf.pop()
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns and clears the overrun flag.
    pub fn take_overrun(&mut self) -> bool {
        core::mem::take(&mut self.overrun)
    }
}

impl<const N: usize> Default for RxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for RxRing<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxRing")
            .field("len", &self.buf.len())
            .field("overrun", &self.overrun)
            .finish()
    }
}

impl<const N: usize> RxSink for RxRing<N> {
    fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    fn put(&mut self, byte: u8) {
        if self.buf.try_push(byte).is_err() {
            self.overrun = true;
        }
    }

    fn mark_overrun(&mut self) {
        self.overrun = true;
    }
}
