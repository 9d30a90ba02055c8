//! Software copy of the interrupt mask register.
//!
//! IMR is write-only (its offset reads back ISR), so the enabled set is kept
//! in memory and every change is written out whole. Mutation takes
//! `&mut self`; the session keeps the mask inside its lock, so a
//! read-modify-write can never interleave with another.

use uartdm_mmio::RegisterIo;

use crate::regs::{Irq, UartDmRegs};

/// Shadow of IMR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptMask {
    enabled: Irq,
}

impl InterruptMask {
    /// All sources disabled, matching the controller after initialization.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: Irq::empty(),
        }
    }

    /// The sources currently enabled.
    #[must_use]
    pub const fn enabled(&self) -> Irq {
        self.enabled
    }

    /// Replaces the enabled set.
    pub fn set(&mut self, sources: Irq) -> &mut Self {
        self.enabled = sources;
        self
    }

    /// Adds sources.
    pub fn enable(&mut self, sources: Irq) -> &mut Self {
        self.enabled.insert(sources);
        self
    }

    /// Removes sources.
    pub fn disable(&mut self, sources: Irq) -> &mut Self {
        self.enabled.remove(sources);
        self
    }

    /// Writes the shadow to IMR.
    pub fn commit<IO: RegisterIo>(&self, regs: &UartDmRegs<IO>) {
        regs.set_imr(self.enabled);
    }
}

impl Default for InterruptMask {
    fn default() -> Self {
        Self::new()
    }
}
