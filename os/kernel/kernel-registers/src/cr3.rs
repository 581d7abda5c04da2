use bitfield_struct::bitfield;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
use crate::{LoadRegisterUnsafe, StoreRegisterUnsafe};

/// CR3, the page-map level-4 base register (PCID disabled).
///
/// Holds the physical frame of the root page table of the active address
/// space. Writing it switches address spaces and flushes all non-global
/// translations.
#[bitfield(u64)]
pub struct Cr3 {
    /// Bits 0–2, reserved.
    #[bits(3)]
    __: u8,

    /// Bit 3, page-level write-through for the root table walk.
    pub pwt: bool,

    /// Bit 4, page-level cache disable for the root table walk.
    pub pcd: bool,

    /// Bits 5–11, reserved.
    #[bits(7)]
    __: u8,

    /// Bits 12–51, root table frame number.
    #[bits(40)]
    root_frame: u64,

    /// Bits 52–63, reserved.
    #[bits(12)]
    __: u16,
}

impl Cr3 {
    /// CR3 value selecting `root` as the active root table, write-back cached.
    #[must_use]
    pub const fn from_root(root: PhysicalPage<Size4K>) -> Self {
        Self::new().with_root_frame(root.frame_index())
    }

    /// CR3 value from a root table address and cache-control flags.
    ///
    /// `root` must be 4 KiB-aligned.
    #[must_use]
    pub fn from_root_phys(root: PhysicalAddress, pwt: bool, pcd: bool) -> Self {
        debug_assert!(root.is_aligned::<Size4K>(), "root table must be 4K-aligned");
        Self::from_root(root.page())
            .with_pwt(pwt)
            .with_pcd(pcd)
    }

    /// The root table frame.
    #[must_use]
    pub const fn root(&self) -> PhysicalPage<Size4K> {
        PhysicalPage::from_frame_index(self.root_frame())
    }
}

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl LoadRegisterUnsafe for Cr3 {
    unsafe fn load_unsafe() -> Self {
        let cr3: u64;
        unsafe {
            core::arch::asm!("mov {}, cr3", out(reg) cr3, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(cr3)
    }
}

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl StoreRegisterUnsafe for Cr3 {
    unsafe fn store_unsafe(self) {
        let cr3 = self.into_bits();
        unsafe {
            core::arch::asm!("mov cr3, {}", in(reg) cr3, options(nostack, preserves_flags));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_roundtrip() {
        let root = PhysicalPage::<Size4K>::from_frame_index(0x1234);
        let cr3 = Cr3::from_root(root);
        assert_eq!(cr3.into_bits(), 0x0123_4000);
        assert_eq!(cr3.root(), root);
    }

    #[test]
    fn cache_flags_do_not_leak_into_root() {
        let cr3 = Cr3::from_root_phys(PhysicalAddress::new(0x20_0000), true, true);
        assert!(cr3.pwt());
        assert!(cr3.pcd());
        assert_eq!(cr3.into_bits() & 0xFFF, 0b1_1000);
        assert_eq!(cr3.root().base().as_u64(), 0x20_0000);
    }
}
