//! Register access primitives for memory-mapped controllers.
//!
//! Three pieces:
//!
//! - [`RegisterIo`]: 32-bit reads and writes at byte offsets from a base,
//!   plus a [`barrier`](RegisterIo::barrier) that must complete before the
//!   hardware sees anything issued after it.
//! - [`Mmio`]: the volatile backend for real hardware. Constructing one is the
//!   single `unsafe` point; every access through it is safe.
//! - [`register_block!`]: generates a typed register map over any
//!   [`RegisterIo`] backend.
//!
//! With the `mock` feature, [`mock::MockIo`] records every access so driver
//! protocol sequences can be checked on the host.
//!
//! # Example
//!
//! ```ignore
//! use uartdm_mmio::register_block;
//!
//! register_block! {
//!     /// Status and data registers.
//!     pub DemoRegs {
//!         /// Status (read side of 0x08).
//!         [0x08; ro] sr => Status,
//!         /// Clock select (write side of 0x08).
//!         [0x08; wo] csr,
//!         /// FIFO words.
//!         [0x70; rw; 4] fifo,
//!     }
//! }
//! ```

#![cfg_attr(not(any(test, feature = "mock")), no_std)]

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use uartdm_mmio_macros::register_block;

/// A 32-bit register window.
///
/// Offsets are byte offsets from the window base. Implementations must not
/// reorder writes to the same window relative to each other.
pub trait RegisterIo {
    /// Reads the 32-bit register at `offset`.
    fn read32(&self, offset: usize) -> u32;

    /// Writes the 32-bit register at `offset`.
    fn write32(&self, offset: usize, value: u32);

    /// Waits until every previous write has reached the device.
    fn barrier(&self);
}

impl<T: RegisterIo + ?Sized> RegisterIo for &T {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        (**self).write32(offset, value);
    }

    #[inline]
    fn barrier(&self) {
        (**self).barrier();
    }
}

/// Produces a backend for a base address chosen at call time.
///
/// Used where the base can move between calls (early boot consoles that
/// switch from physical to virtual addressing), so the caller re-resolves the
/// window on every access sequence instead of holding one.
pub trait IoMapper {
    /// The backend type produced for a base.
    type Io: RegisterIo;

    /// Returns a backend addressing the window at `base`.
    fn map(&self, base: usize) -> Self::Io;
}

// ---------------------------------------------------------------------------
// Volatile MMIO backend
// ---------------------------------------------------------------------------

/// Volatile backend over a mapped register window.
#[derive(Debug, Clone, Copy)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Creates a backend for the window at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of the controller's register window, mapped
    /// as device memory and covering every offset the caller will use, for as
    /// long as this value (or a copy) is alive.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Returns the window base address.
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterIo for Mmio {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: `new` requires `base + offset` to be a mapped register.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        // SAFETY: `new` requires `base + offset` to be a mapped register.
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }

    #[inline]
    fn barrier(&self) {
        data_sync_barrier();
    }
}

// SAFETY: `Mmio` is an address into device memory; register accesses are valid
// from any CPU, and callers serialize sequences with their own lock.
unsafe impl Send for Mmio {}
unsafe impl Sync for Mmio {}

/// [`IoMapper`] producing [`Mmio`] backends.
#[derive(Debug, Clone, Copy)]
pub struct MmioMapper {
    _private: (),
}

impl MmioMapper {
    /// Creates the mapper.
    ///
    /// # Safety
    ///
    /// Every base later passed to [`map`](IoMapper::map) must satisfy the
    /// contract of [`Mmio::new`].
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl IoMapper for MmioMapper {
    type Io = Mmio;

    fn map(&self, base: usize) -> Mmio {
        // SAFETY: Guaranteed by the caller of `MmioMapper::new`.
        unsafe { Mmio::new(base) }
    }
}

/// Full-system data synchronization barrier.
///
/// `dsb sy` waits for outstanding device writes to complete.
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
#[inline]
pub fn data_sync_barrier() {
    // SAFETY: `dsb` only orders memory accesses.
    unsafe {
        core::arch::asm!("dsb sy", options(nostack, preserves_flags));
    }
}

/// Full-system data synchronization barrier.
///
/// Hosts without a device barrier instruction fall back to a sequentially
/// consistent fence.
#[cfg(not(any(target_arch = "aarch64", target_arch = "arm")))]
#[inline]
pub fn data_sync_barrier() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mmio_reads_and_writes_memory() {
        let mut window = [0u32; 4];
        // SAFETY: `window` outlives `io` and covers offsets 0..16.
        let io = unsafe { Mmio::new(window.as_mut_ptr() as usize) };
        io.write32(0x8, 0xDEAD_BEEF);
        io.barrier();
        assert_eq!(io.read32(0x8), 0xDEAD_BEEF);
        assert_eq!(io.read32(0x0), 0);
        assert_eq!(window[2], 0xDEAD_BEEF);
    }

    #[test]
    fn reference_forwards_to_backend() {
        let mut window = [0u32; 2];
        // SAFETY: `window` outlives `io`.
        let io = unsafe { Mmio::new(window.as_mut_ptr() as usize) };
        let by_ref: &Mmio = &io;
        RegisterIo::write32(&by_ref, 0x4, 7);
        assert_eq!(RegisterIo::read32(&by_ref, 0x4), 7);
        assert_eq!(io.base(), window.as_ptr() as usize);
    }

    #[test]
    fn mapper_uses_requested_base() {
        // SAFETY: The mapped backend is never accessed.
        let mapper = unsafe { MmioMapper::new() };
        let io = mapper.map(0x1000);
        assert_eq!(io.base(), 0x1000);
    }
}
