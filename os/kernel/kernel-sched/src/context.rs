use core::fmt;
use kernel_registers::rflags::Rflags;

/// Saved register state of a preempted task.
///
/// The layout matches the stack of the timer interrupt entry once it has
/// pushed `rax` through `r15` on top of the CPU's interrupt frame:
///
/// ```text
///   +0x00  r15        ◀── rsp after the last push
///   ...
///   +0x70  rax
///   +0x78  rip        ┐
///   +0x80  cs         │
///   +0x88  rflags     │ pushed by the CPU
///   +0x90  rsp        │
///   +0x98  ss         ┘
/// ```
///
/// Restoring is the mirror image: point `rsp` at a context, pop the
/// general-purpose registers and `iretq`.
#[derive(Copy, Clone, Eq, PartialEq)]
#[repr(C)]
pub struct TaskContext {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rbp: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: Rflags,
    pub rsp: u64,
    pub ss: u64,
}

const _: () = {
    assert!(size_of::<TaskContext>() == 20 * 8);
    assert!(core::mem::offset_of!(TaskContext, rax) == 0x70);
    assert!(core::mem::offset_of!(TaskContext, rip) == 0x78);
    assert!(core::mem::offset_of!(TaskContext, ss) == 0x98);
};

impl TaskContext {
    /// All registers zero, `rflags` with only the fixed bit set.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            r15: 0,
            r14: 0,
            r13: 0,
            r12: 0,
            r11: 0,
            r10: 0,
            r9: 0,
            r8: 0,
            rbp: 0,
            rdi: 0,
            rsi: 0,
            rdx: 0,
            rcx: 0,
            rbx: 0,
            rax: 0,
            rip: 0,
            cs: 0,
            rflags: Rflags::new(),
            rsp: 0,
            ss: 0,
        }
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Hex(u64);
        impl fmt::Debug for Hex {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#018x}", self.0)
            }
        }

        f.debug_struct("TaskContext")
            .field("rip", &Hex(self.rip))
            .field("cs", &Hex(self.cs))
            .field("rflags", &Hex(self.rflags.into_bits()))
            .field("rsp", &Hex(self.rsp))
            .field("ss", &Hex(self.ss))
            .field("rax", &Hex(self.rax))
            .field("rbx", &Hex(self.rbx))
            .field("rcx", &Hex(self.rcx))
            .field("rdx", &Hex(self.rdx))
            .field("rsi", &Hex(self.rsi))
            .field("rdi", &Hex(self.rdi))
            .field("rbp", &Hex(self.rbp))
            .field("r8", &Hex(self.r8))
            .field("r9", &Hex(self.r9))
            .field("r10", &Hex(self.r10))
            .field("r11", &Hex(self.r11))
            .field("r12", &Hex(self.r12))
            .field("r13", &Hex(self.r13))
            .field("r14", &Hex(self.r14))
            .field("r15", &Hex(self.r15))
            .finish()
    }
}
