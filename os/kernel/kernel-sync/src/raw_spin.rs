use crate::{RawLock, RawUnlock};
use core::hint::spin_loop;
use core::sync::atomic::{AtomicU32, Ordering};

/// Ticket spin lock.
///
/// Waiters draw a ticket and spin until `serving` reaches it, so the lock is
/// granted in arrival order. Tickets wrap; more than `u32::MAX` concurrent
/// waiters is not a case a kernel runs into.
pub struct RawSpin {
    next: AtomicU32,
    serving: AtomicU32,
}

impl Default for RawSpin {
    fn default() -> Self {
        Self::new()
    }
}

impl RawSpin {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(0),
            serving: AtomicU32::new(0),
        }
    }

    /// Snapshot only; another core may take or drop the lock right after.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.next.load(Ordering::Relaxed) != self.serving.load(Ordering::Relaxed)
    }
}

impl RawLock for RawSpin {
    #[inline]
    fn raw_lock(&self) {
        let ticket = self.next.fetch_add(1, Ordering::Relaxed);
        while self.serving.load(Ordering::Acquire) != ticket {
            spin_loop();
        }
    }

    #[inline]
    fn raw_try_lock(&self) -> bool {
        let serving = self.serving.load(Ordering::Relaxed);
        self.next
            .compare_exchange(
                serving,
                serving.wrapping_add(1),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
    }
}

impl RawUnlock for RawSpin {
    #[inline]
    unsafe fn raw_unlock(&self) {
        let current = self.serving.load(Ordering::Relaxed);
        self.serving.store(current.wrapping_add(1), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_pass_the_lock_along() {
        let lock = RawSpin::new();
        assert!(!lock.is_locked());

        lock.raw_lock();
        assert!(lock.is_locked());
        assert!(!lock.raw_try_lock());

        unsafe { lock.raw_unlock() };
        assert!(!lock.is_locked());
        assert!(lock.raw_try_lock());
        unsafe { lock.raw_unlock() };
    }

    #[test]
    fn wrapping_counters() {
        let lock = RawSpin {
            next: AtomicU32::new(u32::MAX),
            serving: AtomicU32::new(u32::MAX),
        };
        lock.raw_lock();
        unsafe { lock.raw_unlock() };
        assert!(!lock.is_locked());
        assert!(lock.raw_try_lock());
        unsafe { lock.raw_unlock() };
    }
}
