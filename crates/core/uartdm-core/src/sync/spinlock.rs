//! Test-and-test-and-set spin lock.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

use super::loom_compat::{AtomicBool, Ordering, spin_loop};

/// A spin-based mutual exclusion lock.
///
/// Spins on a plain load while the lock is held so waiters share the cache
/// line instead of bouncing it with failed exchanges.
pub struct SpinLock<T> {
    locked: AtomicBool,
    name: &'static str,
    data: UnsafeCell<T>,
}

// SAFETY: Access to `data` is serialized by `locked`; `T: Send` is required
// because the value may be reached from whichever CPU takes the lock.
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates an unlocked `SpinLock` wrapping `value`.
    #[cfg(not(loom))]
    pub const fn new(value: T) -> Self {
        Self::named("<unnamed>", value)
    }

    /// Creates an unlocked, named `SpinLock`.
    ///
    /// The name only shows up in [`name`](Self::name) for diagnostics.
    #[cfg(not(loom))]
    pub const fn named(name: &'static str, value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            name,
            data: UnsafeCell::new(value),
        }
    }

    /// Creates an unlocked `SpinLock` wrapping `value`.
    #[cfg(loom)]
    pub fn new(value: T) -> Self {
        Self::named("<unnamed>", value)
    }

    /// Creates an unlocked, named `SpinLock`.
    #[cfg(loom)]
    pub fn named(name: &'static str, value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            name,
            data: UnsafeCell::new(value),
        }
    }

    /// Returns the diagnostic name given at construction.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Acquires the lock, spinning until it is free.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        loop {
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return SpinLockGuard { lock: self };
            }

            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    /// Acquires the lock if it is free, without spinning.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinLockGuard { lock: self })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the data; no locking is needed because
    /// `&mut self` proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consumes the lock and returns the data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// RAII guard; the lock is released on drop.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: The guard holds the lock.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: The guard holds the lock.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}
