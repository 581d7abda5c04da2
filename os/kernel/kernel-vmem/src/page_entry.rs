use crate::PageFlags;
use bitfield_struct::bitfield;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};

/// A single 64-bit x86-64 page table entry, identical at every level.
///
/// ### Bit layout
///
/// | Bits      | Name / Mnemonic   | Meaning |
/// |-----------|-------------------|----------|
/// | 0         | `P` (present)     | Valid entry if set |
/// | 1         | `RW`              | Writable if set |
/// | 2         | `US`              | User-mode accessible if set |
/// | 3         | `PWT`             | Write-through caching |
/// | 4         | `PCD`             | Disable caching |
/// | 5         | `A`               | Accessed |
/// | 6         | `D`               | Dirty (leaf only) |
/// | 7         | `PS`              | Large page (L3/L2 only) |
/// | 8         | `G`               | Global (leaf only) |
/// | 9–11      | OS avail low      | Ignored by hardware |
/// | 12–51     | frame             | Physical frame number |
/// | 52–62     | OS avail high     | Ignored by hardware |
/// | 63        | `NX`              | Execute disable |
///
/// The mapper writes `P`, `RW`, `US` and the frame; everything else stays
/// whatever the caller's [`PageFlags`] say, usually zero.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PageTableEntry {
    pub present: bool,
    pub writable: bool,
    pub user_access: bool,
    pub write_through: bool,
    pub cache_disabled: bool,
    pub accessed: bool,
    pub dirty: bool,
    /// PS: at L3/L2 the entry maps a 1 GiB / 2 MiB page instead of a table.
    pub large_page: bool,
    pub global_translation: bool,

    #[bits(3)]
    pub os_available_low: u8,

    /// Physical address bits [51:12].
    #[bits(40)]
    frame_number: u64,

    #[bits(11)]
    pub os_available_high: u16,

    pub no_execute: bool,
}

impl PageTableEntry {
    /// Link to a next-level table: present, writable, and user-accessible if asked.
    #[inline]
    #[must_use]
    pub const fn table(frame: PhysicalPage<Size4K>, user: bool) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(true)
            .with_user_access(user)
            .with_frame_number(frame.frame_index())
    }

    /// A 4 KiB leaf mapping `frame` with `flags | PRESENT`.
    #[inline]
    #[must_use]
    pub const fn leaf(frame: PhysicalPage<Size4K>, flags: PageFlags) -> Self {
        Self::from_bits(flags.union(PageFlags::PRESENT).bits())
            .with_large_page(false)
            .with_frame_number(frame.frame_index())
    }

    /// The frame this entry points at (a table or a mapped page).
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> PhysicalPage<Size4K> {
        PhysicalPage::from_frame_index(self.frame_number())
    }

    /// Full physical address stored in the entry.
    #[inline]
    #[must_use]
    pub const fn physical_address(&self) -> PhysicalAddress {
        self.frame().base()
    }

    /// The permission and caching flags of this entry.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> PageFlags {
        PageFlags::from_bits_truncate(self.into_bits())
    }
}
