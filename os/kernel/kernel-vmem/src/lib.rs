//! # Virtual Memory Support
//!
//! Builds and walks the x86-64 four-level page-table hierarchy of an
//! [`AddressSpace`].
//!
//! ## What you get
//! - [`PageTableEntry`]: the raw 64-bit entry as a bitfield.
//! - [`PageTable`]: one 4 KiB-aligned level of 512 entries.
//! - [`PageIndex`] / [`PageLevel`]: decomposition of a virtual address.
//! - [`PageFlags`]: the caller-facing permission flags for a mapping.
//! - The seams to the rest of the kernel: [`FrameAlloc`] for backing frames,
//!   [`PhysMapper`] to reach a frame's bytes, and [`Mmu`] for CR3/TLB access.
//!
//! ## x86-64 Virtual Address → Physical Address Walk
//!
//! Each 48-bit virtual address is divided into five fields:
//!
//! ```text
//! | 47‒39 | 38‒30 | 29‒21 | 20‒12 | 11‒0   |
//! |   L4  |   L3  |   L2  |   L1  | Offset |
//! ```
//!
//! The CPU uses these fields as **indices** into four levels of page tables,
//! each level containing 512 (2⁹) entries of 8 bytes each.
//!
//! ```text
//!  L4 (CR3)  →  L3  →  L2  →  L1  →  4 KiB frame
//! ```
//!
//! A not-present entry at any level makes the address untranslatable. The
//! mapper only ever creates 4 KiB leaves at L1; [`AddressSpace::translate`]
//! additionally understands 2 MiB and 1 GiB leaves it may find in tables it
//! did not build (e.g. the bootloader's).
//!
//! ## Example
//!
//! ```rust
//! use kernel_memory_addresses::VirtualAddress;
//! use kernel_vmem::{PageIndex, PageLevel};
//!
//! let idx = PageIndex::of(VirtualAddress::new(0xFFFF_8000_0020_1ABC));
//! assert_eq!(idx.at(PageLevel::L4), 256);
//! assert_eq!(idx.at(PageLevel::L3), 0);
//! assert_eq!(idx.at(PageLevel::L2), 1);
//! assert_eq!(idx.at(PageLevel::L1), 1);
//! assert_eq!(idx.offset(), 0xABC);
//! ```

#![cfg_attr(not(test), no_std)]
#![allow(unsafe_code)]

pub mod address_space;
mod mmu;
mod page_entry;
mod page_table;

pub use crate::address_space::AddressSpace;
#[cfg(target_arch = "x86_64")]
pub use crate::mmu::X86Mmu;
pub use crate::mmu::Mmu;
pub use crate::page_entry::PageTableEntry;
pub use crate::page_table::{ENTRIES_PER_TABLE, PageIndex, PageLevel, PageTable};

/// Re-export constants as info module.
pub use kernel_info::memory as info;

use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K, VirtualAddress};

bitflags::bitflags! {
    /// Permission and caching flags of a mapping.
    ///
    /// The bit positions match the hardware entry, so a flag set converts to
    /// entry bits without translation. [`PRESENT`](Self::PRESENT) is always
    /// added by [`AddressSpace::map`].
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct PageFlags: u64 {
        /// Page is present in physical memory.
        const PRESENT = 1 << 0;

        /// Page is writable; read-only when clear.
        const WRITABLE = 1 << 1;

        /// Page is accessible from user mode (CPL=3).
        ///
        /// Intermediate tables on the path are made user-accessible too.
        const USER = 1 << 2;

        /// Write-through caching.
        const WRITE_THROUGH = 1 << 3;

        /// Caching disabled; for MMIO.
        const CACHE_DISABLE = 1 << 4;

        /// TLB entry survives CR3 reloads when CR4.PGE is enabled.
        const GLOBAL = 1 << 8;

        /// Instruction fetches fault (requires EFER.NXE).
        const NO_EXECUTE = 1 << 63;
    }
}

/// Source of **physical** 4 KiB frames for page tables, leaves and stacks.
///
/// Returned frames are 4 KiB aligned by construction. `None` is the only
/// out-of-memory signal.
pub trait FrameAlloc {
    /// Why a frame could not be given back.
    type Error: core::fmt::Debug;

    /// Allocate one frame, or `None` if physical memory is exhausted.
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>>;

    /// Return a frame previously obtained from [`alloc_4k`](Self::alloc_4k).
    ///
    /// # Errors
    /// Implementation-defined, e.g. a frame that was not allocated.
    fn free_4k(&mut self, frame: PhysicalPage<Size4K>) -> Result<(), Self::Error>;
}

impl<A: FrameAlloc + ?Sized> FrameAlloc for &mut A {
    type Error = A::Error;

    #[inline]
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>> {
        (**self).alloc_4k()
    }

    #[inline]
    fn free_4k(&mut self, frame: PhysicalPage<Size4K>) -> Result<(), Self::Error> {
        (**self).free_4k(frame)
    }
}

/// Converts physical addresses into addresses usable in the current virtual
/// address space (identity map, higher-half direct map, or a test arena).
pub trait PhysMapper {
    /// The virtual address at which the bytes of `pa` are visible.
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress;

    /// Borrow the bytes at `pa` as a `T`.
    ///
    /// # Safety
    /// - `pa` must be mapped writable at [`phys_to_virt`](Self::phys_to_virt)`(pa)`.
    /// - The bytes must be a valid `T` and suitably aligned.
    /// - No other reference to the same bytes may be live for `'a`.
    #[inline]
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        unsafe { &mut *self.phys_to_virt(pa).as_mut_ptr::<T>() }
    }
}

/// Why a mapping could not be installed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MapError {
    /// No frame was available for a table at `level`; nothing was changed.
    #[error("out of physical memory while allocating a {level} table")]
    OutOfMemory { level: PageLevel },

    /// The virtual or the physical address is not 4 KiB aligned.
    #[error("unaligned mapping {va:?} -> {pa:?}")]
    Unaligned {
        va: VirtualAddress,
        pa: PhysicalAddress,
    },

    /// A range mapping ran past the end of the address space.
    #[error("range starting at {va:?} overflows the address space")]
    AddressOverflow { va: VirtualAddress },

    /// A 2 MiB or 1 GiB leaf at `level` already covers the address; it is
    /// not split into 4 KiB pages.
    #[error("{va:?} lies inside a large page mapped at {level}")]
    LargePage { va: VirtualAddress, level: PageLevel },

    /// The address is not part of the linked kernel image.
    #[error("{va:?} lies outside the kernel image")]
    OutsideKernelImage { va: VirtualAddress },
}
