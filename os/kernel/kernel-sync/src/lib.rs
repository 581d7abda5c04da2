//! # Kernel synchronization primitives
//!
//! Single-core kernel state is shared between normal execution and interrupt
//! handlers. Every mutation of such state goes through a [`SpinMutex`] taken
//! with interrupts disabled ([`Mutex::lock_irq`]), so a handler can never
//! observe or re-enter a half-finished update.
//!
//! The interrupt flag is reached through the [`InterruptControl`] trait:
//! [`X86Interrupts`] drives `cli`/`sti` on the real CPU and host tests plug
//! in a fake.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod irq;
mod mutex;
mod raw_spin;
mod sync_once_cell;

#[cfg(target_arch = "x86_64")]
pub use irq::X86Interrupts;
pub use irq::{InterruptControl, IrqGuard, IrqMutex};
pub use mutex::{Mutex, MutexGuard};
pub use raw_spin::RawSpin;
pub use sync_once_cell::SyncOnceCell;

pub type SpinMutex<T> = Mutex<T, RawSpin>;

impl<T> SpinMutex<T> {
    pub const fn new(value: T) -> Self {
        Self::from_raw(RawSpin::new(), value)
    }
}

pub trait RawLock {
    fn raw_lock(&self);
    fn raw_try_lock(&self) -> bool;
}

pub trait RawUnlock {
    /// # Safety
    /// Only the current holder of the lock may release it.
    unsafe fn raw_unlock(&self);
}
