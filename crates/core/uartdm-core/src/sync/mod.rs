//! Locks usable before any scheduler exists.
//!
//! [`IrqSpinLock`] is what the driver session holds around every register
//! sequence for one controller, since interrupt dispatch takes the same
//! lock. [`SpinLock`] is the plain lock underneath it.

mod irq_spinlock;
mod loom_compat;
mod spinlock;

pub use irq_spinlock::{IrqOps, IrqSpinLock, IrqSpinLockGuard, set_irq_ops};
pub use spinlock::{SpinLock, SpinLockGuard};
