use kernel_memory_addresses::{PhysicalPage, Size4K, VirtualAddress};

#[cfg(target_arch = "x86_64")]
use kernel_registers::{LoadRegisterUnsafe, StoreRegisterUnsafe, cr3::Cr3};

/// The translation hardware: which root is live, and its TLB.
pub trait Mmu {
    /// Root table frame of the currently active address space.
    fn active_root(&self) -> PhysicalPage<Size4K>;

    /// Make `root` the active address space.
    ///
    /// # Safety
    /// `root` must be a valid L4 table that maps the currently executing
    /// code, the stack and every structure the caller touches afterwards.
    unsafe fn activate(&self, root: PhysicalPage<Size4K>);

    /// Drop any cached translation of the page containing `va`.
    fn invalidate_page(&self, va: VirtualAddress);
}

/// The local CPU's MMU, driven through CR3 and `invlpg`.
#[cfg(target_arch = "x86_64")]
pub struct X86Mmu {
    _private: (),
}

#[cfg(target_arch = "x86_64")]
impl X86Mmu {
    /// # Safety
    /// Only usable at CPL0 with paging enabled.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(target_arch = "x86_64")]
impl Mmu for X86Mmu {
    #[inline]
    fn active_root(&self) -> PhysicalPage<Size4K> {
        // SAFETY: constructing `X86Mmu` asserted CPL0.
        unsafe { Cr3::load_unsafe() }.root()
    }

    #[inline]
    unsafe fn activate(&self, root: PhysicalPage<Size4K>) {
        unsafe { Cr3::from_root(root).store_unsafe() }
    }

    #[inline]
    fn invalidate_page(&self, va: VirtualAddress) {
        unsafe {
            core::arch::asm!("invlpg [{}]", in(reg) va.as_u64(), options(nostack, preserves_flags));
        }
    }
}
