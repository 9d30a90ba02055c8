//! Timing hooks used between register polls.

/// A short busy delay.
///
/// Drivers call this between polls of a status register. Implementations
/// must not sleep or yield; callers may hold a spin lock.
pub trait Delay {
    /// Busy-waits for roughly `us` microseconds.
    fn delay_us(&self, us: u32);
}

/// Calibrated busy loop.
#[derive(Debug, Clone, Copy)]
pub struct SpinDelay {
    loops_per_us: u32,
}

impl SpinDelay {
    /// Conservative calibration for early boot, before a timer is available.
    pub const DEFAULT_LOOPS_PER_US: u32 = 100;

    /// Creates a delay spinning `loops_per_us` iterations per microsecond.
    #[must_use]
    pub const fn new(loops_per_us: u32) -> Self {
        Self { loops_per_us }
    }
}

impl Default for SpinDelay {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOOPS_PER_US)
    }
}

impl Delay for SpinDelay {
    fn delay_us(&self, us: u32) {
        for _ in 0..us.saturating_mul(self.loops_per_us) {
            core::hint::spin_loop();
        }
    }
}

impl<D: Delay + ?Sized> Delay for &D {
    fn delay_us(&self, us: u32) {
        (**self).delay_us(us);
    }
}
