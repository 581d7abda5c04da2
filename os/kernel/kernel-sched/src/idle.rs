//! Idle primitive.

/// Halt until the next interrupt, forever.
///
/// Interrupts are enabled before each `hlt`, so the timer keeps preempting
/// whoever calls this.
#[cfg(target_arch = "x86_64")]
pub fn halt_loop() -> ! {
    loop {
        unsafe {
            core::arch::asm!("sti", "hlt", options(nomem, nostack));
        }
    }
}

/// Task entry that does nothing but idle.
#[cfg(target_arch = "x86_64")]
pub extern "C" fn idle_task() -> ! {
    halt_loop()
}
