//! # Scheduling Parameters

/// Timer ticks between two scheduling decisions.
pub const DEFAULT_QUANTUM_TICKS: u64 = 20;

/// Capacity of the run-queue arena.
pub const MAX_TASKS: usize = 64;

/// Kernel code segment selector (GDT index 1, RPL 0).
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;

/// Kernel data/stack segment selector (GDT index 2, RPL 0).
pub const KERNEL_DATA_SELECTOR: u16 = 0x10;

const _: () = {
    assert!(DEFAULT_QUANTUM_TICKS > 0);
    assert!(MAX_TASKS > 0);
    assert!(KERNEL_CODE_SELECTOR & 0b11 == 0);
    assert!(KERNEL_DATA_SELECTOR & 0b11 == 0);
};
