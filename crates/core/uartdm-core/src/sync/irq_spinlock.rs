//! Interrupt-safe spin lock.
//!
//! Masks interrupts on the local CPU before taking the inner [`SpinLock`]
//! and restores the previous state after releasing it. A lock shared with
//! an interrupt handler must be one of these: with interrupts left on, the
//! handler can fire on the CPU that already holds the lock and spin on it
//! forever.
//!
//! How interrupts are masked is an [`IrqOps`] pair. Bare-metal ARM builds
//! use the CPU's own mask bits; hosted builds default to a no-op and may
//! install their own pair with [`set_irq_ops`].

use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicPtr, Ordering};

use super::spinlock::{SpinLock, SpinLockGuard};

/// Saves and masks the local interrupt state, and puts it back.
#[derive(Debug)]
pub struct IrqOps {
    /// Masks interrupts and returns the state they were in.
    pub save_and_disable: fn() -> usize,
    /// Restores a state returned by `save_and_disable`.
    pub restore: fn(usize),
}

static ARCH_OPS: IrqOps = IrqOps {
    save_and_disable: save_flags_and_cli,
    restore: restore_flags,
};

static IRQ_OPS: AtomicPtr<IrqOps> = AtomicPtr::new(core::ptr::addr_of!(ARCH_OPS).cast_mut());

/// Replaces the interrupt save/restore pair used by every [`IrqSpinLock`].
///
/// A guard always restores through the pair it saved with, so swapping the
/// pair while locks are held is harmless.
///
/// # Safety
///
/// `ops` must really keep interrupt handlers that take an `IrqSpinLock` off
/// the current CPU between `save_and_disable` and `restore`, or that code
/// can deadlock.
pub unsafe fn set_irq_ops(ops: &'static IrqOps) {
    IRQ_OPS.store(core::ptr::from_ref(ops).cast_mut(), Ordering::Release);
}

fn irq_ops() -> &'static IrqOps {
    // SAFETY: IRQ_OPS only ever holds `ARCH_OPS` or a `&'static IrqOps`
    // passed to `set_irq_ops`.
    unsafe { &*IRQ_OPS.load(Ordering::Acquire) }
}

/// A [`SpinLock`] that keeps interrupts masked while held.
pub struct IrqSpinLock<T> {
    inner: SpinLock<T>,
}

impl<T> IrqSpinLock<T> {
    /// Creates an unlocked `IrqSpinLock` wrapping `value`.
    #[cfg(not(loom))]
    pub const fn new(value: T) -> Self {
        Self::named("<unnamed>", value)
    }

    /// Creates an unlocked, named `IrqSpinLock`.
    #[cfg(not(loom))]
    pub const fn named(name: &'static str, value: T) -> Self {
        Self {
            inner: SpinLock::named(name, value),
        }
    }

    /// Creates an unlocked `IrqSpinLock` wrapping `value`.
    #[cfg(loom)]
    pub fn new(value: T) -> Self {
        Self::named("<unnamed>", value)
    }

    /// Creates an unlocked, named `IrqSpinLock`.
    #[cfg(loom)]
    pub fn named(name: &'static str, value: T) -> Self {
        Self {
            inner: SpinLock::named(name, value),
        }
    }

    /// Returns the diagnostic name given at construction.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Masks interrupts, then acquires the lock.
    pub fn lock(&self) -> IrqSpinLockGuard<'_, T> {
        let ops = irq_ops();
        let saved_flags = (ops.save_and_disable)();
        IrqSpinLockGuard {
            guard: ManuallyDrop::new(self.inner.lock()),
            ops,
            saved_flags,
            _not_send: PhantomData,
        }
    }

    /// Acquires the lock if it is free. On failure the interrupt state is
    /// restored before returning.
    pub fn try_lock(&self) -> Option<IrqSpinLockGuard<'_, T>> {
        let ops = irq_ops();
        let saved_flags = (ops.save_and_disable)();
        if let Some(guard) = self.inner.try_lock() {
            Some(IrqSpinLockGuard {
                guard: ManuallyDrop::new(guard),
                ops,
                saved_flags,
                _not_send: PhantomData,
            })
        } else {
            (ops.restore)(saved_flags);
            None
        }
    }

    /// Returns a mutable reference to the data; `&mut self` proves
    /// exclusivity, so interrupts are left alone.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Consumes the lock and returns the data.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

/// RAII guard; releases the lock, then restores the interrupt state.
///
/// Not `Send`: the saved state belongs to the CPU that took the lock.
pub struct IrqSpinLockGuard<'a, T> {
    guard: ManuallyDrop<SpinLockGuard<'a, T>>,
    ops: &'static IrqOps,
    saved_flags: usize,
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for IrqSpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for IrqSpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for IrqSpinLockGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `guard` is dropped exactly once, here, and not used after.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        (self.ops.restore)(self.saved_flags);
    }
}

#[cfg(all(target_os = "none", target_arch = "arm"))]
const CPSR_F: usize = 1 << 6;
#[cfg(all(target_os = "none", target_arch = "arm"))]
const CPSR_I: usize = 1 << 7;

#[cfg(all(target_os = "none", target_arch = "arm"))]
fn save_flags_and_cli() -> usize {
    let cpsr: u32;
    // SAFETY: Reading CPSR and masking IRQ and FIQ is safe in kernel mode.
    unsafe {
        core::arch::asm!(
            "mrs {}, cpsr",
            "cpsid if",
            out(reg) cpsr,
            options(nomem, nostack),
        );
    }
    cpsr as usize
}

#[cfg(all(target_os = "none", target_arch = "arm"))]
fn restore_flags(flags: usize) {
    // Only the mask bits are restored.
    if flags & CPSR_I == 0 {
        // SAFETY: Re-enabling IRQs restores the state saved by the lock.
        unsafe { core::arch::asm!("cpsie i", options(nomem, nostack, preserves_flags)) };
    }
    if flags & CPSR_F == 0 {
        // SAFETY: As above, for FIQs.
        unsafe { core::arch::asm!("cpsie f", options(nomem, nostack, preserves_flags)) };
    }
}

#[cfg(all(target_os = "none", target_arch = "aarch64"))]
#[allow(clippy::cast_possible_truncation)]
fn save_flags_and_cli() -> usize {
    let flags: u64;
    // SAFETY: Reading DAIF and masking interrupts is safe in kernel mode.
    unsafe {
        core::arch::asm!(
            "mrs {}, DAIF",
            "msr DAIFSet, #0xf",
            out(reg) flags,
            options(nomem),
        );
    }
    flags as usize
}

#[cfg(all(target_os = "none", target_arch = "aarch64"))]
fn restore_flags(flags: usize) {
    // SAFETY: Restoring DAIF puts back the state saved by the lock.
    unsafe {
        core::arch::asm!(
            "msr DAIF, {}",
            in(reg) flags as u64,
            options(nomem, nostack, preserves_flags),
        );
    }
}

#[cfg(not(all(target_os = "none", any(target_arch = "arm", target_arch = "aarch64"))))]
fn save_flags_and_cli() -> usize {
    0
}

#[cfg(not(all(target_os = "none", any(target_arch = "arm", target_arch = "aarch64"))))]
fn restore_flags(_flags: usize) {}
