use crate::{RawLock, RawUnlock};
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

/// A `T` guarded by the raw lock `R`.
///
/// Interrupt handlers share kernel state with normal code, so prefer
/// [`lock_irq`](Self::lock_irq) over [`lock`](Self::lock) for anything a
/// handler can touch.
pub struct Mutex<T, R> {
    raw: R,
    value: UnsafeCell<T>,
}

// The raw lock serializes all access to `value`.
unsafe impl<T: Send, R: Sync> Sync for Mutex<T, R> {}

impl<T, R> Mutex<T, R> {
    pub const fn from_raw(raw: R, value: T) -> Self {
        Self {
            raw,
            value: UnsafeCell::new(value),
        }
    }
}

impl<T, R> Mutex<T, R>
where
    R: RawLock + RawUnlock,
{
    /// Spin until the lock is ours.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T, R> {
        self.raw.raw_lock();
        unsafe { self.guard() }
    }

    #[inline]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T, R>> {
        if self.raw.raw_try_lock() {
            Some(unsafe { self.guard() })
        } else {
            None
        }
    }

    #[inline]
    pub fn with_lock<U>(&self, f: impl FnOnce(&mut T) -> U) -> U {
        f(&mut self.lock())
    }

    /// # Safety
    /// The caller must have just acquired `self.raw`.
    unsafe fn guard(&self) -> MutexGuard<'_, T, R> {
        MutexGuard {
            raw: &self.raw,
            value: unsafe { &mut *self.value.get() },
        }
    }
}

/// Proof of holding a [`Mutex`]. The lock is released on drop.
pub struct MutexGuard<'a, T, R>
where
    R: RawUnlock,
{
    raw: &'a R,
    value: &'a mut T,
}

impl<T, R: RawUnlock> Deref for MutexGuard<'_, T, R> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.value
    }
}

impl<T, R: RawUnlock> DerefMut for MutexGuard<'_, T, R> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.value
    }
}

impl<T, R: RawUnlock> Drop for MutexGuard<'_, T, R> {
    fn drop(&mut self) {
        unsafe { self.raw.raw_unlock() }
    }
}
