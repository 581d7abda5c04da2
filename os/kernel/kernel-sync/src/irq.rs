use crate::{Mutex, MutexGuard, RawLock, RawUnlock};
use core::marker::PhantomData;

/// Access to the local CPU's interrupt-enable flag.
///
/// The methods are associated functions because the flag is per CPU, not per
/// object; implementors are zero-sized markers.
pub trait InterruptControl {
    /// Whether maskable interrupts are currently enabled.
    fn are_enabled() -> bool;

    /// Mask interrupts.
    fn disable();

    /// Unmask interrupts.
    fn enable();
}

/// The real x86-64 interrupt flag, via `pushfq`, `cli` and `sti`.
///
/// # Safety & Privilege
///
/// `cli`/`sti` are privileged; using this type outside ring 0 faults.
#[cfg(target_arch = "x86_64")]
pub struct X86Interrupts;

#[cfg(target_arch = "x86_64")]
impl InterruptControl for X86Interrupts {
    #[inline]
    fn are_enabled() -> bool {
        const IF: u64 = 1 << 9;
        let r: u64;
        unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(nomem, preserves_flags)) }
        r & IF != 0
    }

    #[inline]
    fn disable() {
        unsafe { core::arch::asm!("cli", options(nomem, nostack, preserves_flags)) }
    }

    #[inline]
    fn enable() {
        unsafe { core::arch::asm!("sti", options(nomem, nostack, preserves_flags)) }
    }
}

/// RAII critical section: disables interrupts on creation and restores the
/// previous state on drop.
///
/// Interrupts are re-enabled on drop **only** if they were enabled when the
/// guard was created, so guards nest correctly.
///
/// # Examples
///
/// ```
/// use core::cell::Cell;
/// use kernel_sync::{InterruptControl, IrqGuard};
///
/// thread_local!(static IF: Cell<bool> = Cell::new(true));
/// struct Fake;
/// impl InterruptControl for Fake {
///     fn are_enabled() -> bool { IF.with(Cell::get) }
///     fn disable() { IF.with(|f| f.set(false)) }
///     fn enable() { IF.with(|f| f.set(true)) }
/// }
///
/// {
///     let _g = IrqGuard::<Fake>::new();
///     assert!(!Fake::are_enabled());
/// }
/// assert!(Fake::are_enabled());
/// ```
pub struct IrqGuard<I: InterruptControl> {
    were_enabled: bool,
    _irq: PhantomData<I>,
}

impl<I: InterruptControl> IrqGuard<I> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        let were_enabled = I::are_enabled();
        if were_enabled {
            I::disable();
        }
        Self {
            were_enabled,
            _irq: PhantomData,
        }
    }

    /// Whether interrupts were enabled when this guard was taken.
    #[inline]
    #[must_use]
    pub const fn were_enabled(&self) -> bool {
        self.were_enabled
    }
}

impl<I: InterruptControl> Default for IrqGuard<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: InterruptControl> Drop for IrqGuard<I> {
    fn drop(&mut self) {
        if self.were_enabled {
            I::enable();
        }
    }
}

/// A mutex guard that also keeps interrupts disabled while held.
///
/// Field order matters: the lock is released before interrupts come back on.
pub struct IrqMutex<'a, T, R: RawLock + RawUnlock, I: InterruptControl> {
    guard: MutexGuard<'a, T, R>,
    _irq: IrqGuard<I>,
}

impl<T, R: RawLock + RawUnlock, I: InterruptControl> core::ops::Deref for IrqMutex<'_, T, R, I> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T, R: RawLock + RawUnlock, I: InterruptControl> core::ops::DerefMut for IrqMutex<'_, T, R, I> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T, R: RawLock + RawUnlock> Mutex<T, R> {
    /// Disable interrupts through `I`, then acquire the lock.
    #[inline]
    pub fn lock_irq_with<I: InterruptControl>(&self) -> IrqMutex<'_, T, R, I> {
        let irq = IrqGuard::<I>::new();
        let guard = self.lock();
        IrqMutex { guard, _irq: irq }
    }

    /// [`lock_irq_with`](Self::lock_irq_with) using the CPU's interrupt flag.
    #[cfg(target_arch = "x86_64")]
    #[inline]
    pub fn lock_irq(&self) -> IrqMutex<'_, T, R, X86Interrupts> {
        self.lock_irq_with::<X86Interrupts>()
    }
}
