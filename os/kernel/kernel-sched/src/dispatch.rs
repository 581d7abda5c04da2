use crate::TaskContext;
use kernel_memory_addresses::{PhysicalPage, Size4K};

/// A decided but not yet performed switch to another task.
///
/// Holds copies of everything needed to resume, so no scheduler lock is held
/// once control is transferred.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Dispatch {
    pub context: TaskContext,
    pub root: PhysicalPage<Size4K>,
}

#[cfg(target_arch = "x86_64")]
impl Dispatch {
    /// Switch to the task's address space and restore its registers.
    ///
    /// CR3 is only reloaded when the root differs from the active one.
    ///
    /// # Safety
    /// - Ring 0 with interrupts disabled.
    /// - `root` must map the task's code and stack as well as the currently
    ///   executing code and stack.
    /// - `context` must describe a resumable state (valid `rip`, selectors
    ///   and stack).
    pub unsafe fn resume(self) -> ! {
        use kernel_vmem::{Mmu, X86Mmu};

        unsafe {
            core::arch::asm!("cli", options(nomem, nostack));
            let mmu = X86Mmu::new();
            if mmu.active_root() != self.root {
                mmu.activate(self.root);
            }
            restore_context(&raw const self.context)
        }
    }
}

/// Load `rsp` with the context itself and unwind it like an interrupt frame.
#[cfg(target_arch = "x86_64")]
#[unsafe(naked)]
unsafe extern "C" fn restore_context(_ctx: *const TaskContext) -> ! {
    core::arch::naked_asm!(
        "mov rsp, rdi",
        "pop r15", "pop r14", "pop r13", "pop r12", "pop r11", "pop r10", "pop r9", "pop r8",
        "pop rbp", "pop rdi", "pop rsi", "pop rdx", "pop rcx", "pop rbx", "pop rax",
        // rip, cs, rflags, rsp, ss
        "iretq",
    )
}
