//! # Timer Interrupt Path
//!
//! The entry stub saves the interrupted registers in [`TaskContext`] layout
//! directly on the stack, acknowledges the interrupt and hands the context
//! to the scheduler. Without a switch it unwinds the same frame and returns
//! to the interrupted code.

use crate::SCHEDULER;
use kernel_sched::TaskContext;
use kernel_sync::SyncOnceCell;

/// End-of-interrupt routine of the active interrupt controller.
static EOI_HOOK: SyncOnceCell<fn()> = SyncOnceCell::new();

/// Register the routine that acknowledges a timer interrupt.
///
/// Returns `false` if a hook was already registered.
pub fn set_eoi_hook(hook: fn()) -> bool {
    EOI_HOOK.set(hook).is_ok()
}

/// Signal end-of-interrupt through the registered hook, if any.
pub fn acknowledge() {
    if let Some(eoi) = EOI_HOOK.get() {
        eoi();
    }
}

/// Interrupt gate target for the timer vector.
#[unsafe(naked)]
pub extern "C" fn timer_interrupt_entry() {
    core::arch::naked_asm!(
        "cld",
        "push rax", "push rbx", "push rcx", "push rdx", "push rsi", "push rdi", "push rbp",
        "push r8", "push r9", "push r10", "push r11", "push r12", "push r13", "push r14", "push r15",

        // rsp now points at a TaskContext.
        "mov rdi, rsp",

        // rbp is callee-saved, so it survives the call and restores rsp.
        "mov rbp, rsp",
        "and rsp, -16",
        "call {handler}",
        "mov rsp, rbp",

        "pop r15", "pop r14", "pop r13", "pop r12", "pop r11", "pop r10", "pop r9", "pop r8",
        "pop rbp", "pop rdi", "pop rsi", "pop rdx", "pop rcx", "pop rbx", "pop rax",
        "iretq",

        handler = sym timer_interrupt_handler,
    )
}

extern "C" fn timer_interrupt_handler(ctx: *const TaskContext) {
    acknowledge();

    // SAFETY: `ctx` points at the frame the entry stub just built, and we
    // run inside an interrupt gate with interrupts disabled.
    unsafe { SCHEDULER.preempt(&*ctx) }
}
