use bitfield_struct::bitfield;

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
use crate::LoadRegister;

/// RFLAGS as seen in 64-bit mode.
///
/// Bit 1 is architecturally fixed to one and carried as a defaulted padding
/// field, so `Rflags::new()` is already a valid value to `iretq` with.
#[bitfield(u64, order = Lsb)]
#[derive(PartialEq, Eq)]
pub struct Rflags {
    /// Carry Flag
    pub cf_carry: bool, // 0

    /// Always 1 in 64-bit mode.
    #[bits(default = true)]
    _always1: bool, // 1

    /// Parity Flag
    pub pf_parity: bool, // 2

    #[bits(default = false)]
    _rsvd3: bool, // 3

    /// Adjust Flag
    pub af_adjust: bool, // 4

    #[bits(default = false)]
    _rsvd5: bool, // 5

    /// Zero Flag
    pub zf_zero: bool, // 6

    /// Sign Flag
    pub sf_sign: bool, // 7

    /// Trap Flag
    pub tf_trap: bool, // 8

    /// Interrupt Enable Flag
    pub if_interrupt_enable: bool, // 9

    /// Direction Flag
    pub df_direction: bool, // 10

    /// Overflow Flag
    pub of_overflow: bool, // 11

    /// I/O Privilege Level
    #[bits(2)]
    pub iopl: u8, // 12–13

    /// Reserved 14–63 (nested task, resume, alignment check, ...), left zero.
    #[bits(50, default = 0)]
    _rest: u64,
}

impl Rflags {
    /// Flags a new kernel task starts with: interrupts enabled, nothing else.
    #[must_use]
    pub const fn for_new_task() -> Self {
        Self::new().with_if_interrupt_enable(true)
    }
}

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl LoadRegister for Rflags {
    #[inline]
    fn load() -> Self {
        let rflags: u64;
        unsafe {
            core::arch::asm!("pushfq; pop {}", out(reg) rflags, options(nomem, preserves_flags));
        }
        Self::from_bits(rflags)
    }
}
