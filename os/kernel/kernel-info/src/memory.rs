//! # Memory Layout

/// Size of a physical frame and of a leaf page mapping.
pub const FRAME_SIZE: u64 = 4096;

/// Number of frames the allocator bitmap can describe (4 GiB of physical memory).
pub const MAX_FRAMES: usize = 1 << 20;

/// Number of `u64` words backing the frame bitmap.
pub const BITMAP_WORDS: usize = MAX_FRAMES / 64;

/// Higher Half Direct Map (HHDM) base.
/// Anything mapped at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
pub const HHDM_BASE: u64 = 0xffff_8000_0000_0000;

/// Where the kernel executes (VMA), matches the linker script.
pub const KERNEL_BASE: u64 = 0xffff_ffff_8000_0000;

/// Where the kernel image bytes live in *physical* memory (LMA).
pub const PHYS_LOAD: u64 = 0x0010_0000; // 1 MiB

/// Physical address backing the kernel image virtual address `va`.
///
/// Returns `None` for addresses below [`KERNEL_BASE`].
#[must_use]
pub const fn kernel_virt_to_phys(va: u64) -> Option<u64> {
    match va.checked_sub(KERNEL_BASE) {
        Some(off) => Some(PHYS_LOAD + off),
        None => None,
    }
}

const _: () = {
    assert!(FRAME_SIZE.is_power_of_two());
    assert!(MAX_FRAMES.is_multiple_of(64));
    assert!(BITMAP_WORDS * 64 == MAX_FRAMES);
    assert!(HHDM_BASE.is_multiple_of(FRAME_SIZE));
    assert!(PHYS_LOAD.is_multiple_of(FRAME_SIZE));
    assert!(KERNEL_BASE > HHDM_BASE);
    // The direct map must be able to cover every frame the bitmap tracks.
    assert!(HHDM_BASE + (MAX_FRAMES as u64) * FRAME_SIZE <= KERNEL_BASE);
};
