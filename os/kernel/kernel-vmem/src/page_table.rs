//! # Page Tables and Index Decomposition

use crate::PageTableEntry;
use core::fmt;
use kernel_memory_addresses::VirtualAddress;

/// Entries per table at every level.
pub const ENTRIES_PER_TABLE: usize = 512;

/// One level of the paging hierarchy: 512 entries, one 4 KiB frame.
#[repr(C, align(4096))]
pub struct PageTable {
    entries: [PageTableEntry; ENTRIES_PER_TABLE],
}

const _: () = assert!(size_of::<PageTable>() == 4096);

impl PageTable {
    /// A table with every entry not-present.
    #[inline]
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            entries: [PageTableEntry::new(); ENTRIES_PER_TABLE],
        }
    }

    /// Clear every entry.
    #[inline]
    pub fn zero(&mut self) {
        self.entries.fill(PageTableEntry::new());
    }

    #[inline]
    #[must_use]
    pub const fn entry(&self, i: usize) -> PageTableEntry {
        self.entries[i]
    }

    /// Plain store; TLB maintenance is the caller's job.
    #[inline]
    pub const fn set(&mut self, i: usize, e: PageTableEntry) {
        self.entries[i] = e;
    }

    /// Number of present entries.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| e.present()).count()
    }
}

/// Paging level, root first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PageLevel {
    L4,
    L3,
    L2,
    L1,
}

impl PageLevel {
    /// The levels that hold links to further tables, root first.
    pub const NON_LEAF: [Self; 3] = [Self::L4, Self::L3, Self::L2];

    /// Bit position of this level's index within a virtual address.
    #[inline]
    #[must_use]
    pub const fn shift(self) -> u32 {
        match self {
            Self::L4 => 39,
            Self::L3 => 30,
            Self::L2 => 21,
            Self::L1 => 12,
        }
    }

    /// The level an entry of this level points to; `None` at L1.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::L4 => Some(Self::L3),
            Self::L3 => Some(Self::L2),
            Self::L2 => Some(Self::L1),
            Self::L1 => None,
        }
    }

    /// Bytes covered by a single entry of this level.
    #[inline]
    #[must_use]
    pub const fn entry_span(self) -> u64 {
        1 << self.shift()
    }
}

impl fmt::Display for PageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::L4 => "L4",
            Self::L3 => "L3",
            Self::L2 => "L2",
            Self::L1 => "L1",
        };
        f.write_str(s)
    }
}

/// A virtual address split into its four table indices and page offset.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PageIndex {
    indices: [u16; 4],
    offset: u16,
}

impl PageIndex {
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn of(va: VirtualAddress) -> Self {
        const fn idx(v: u64, level: PageLevel) -> u16 {
            ((v >> level.shift()) & 0x1FF) as u16
        }

        let v = va.as_u64();
        Self {
            indices: [
                idx(v, PageLevel::L4),
                idx(v, PageLevel::L3),
                idx(v, PageLevel::L2),
                idx(v, PageLevel::L1),
            ],
            offset: (v & 0xFFF) as u16,
        }
    }

    /// Index into the table of `level`, in `0..512`.
    #[inline]
    #[must_use]
    pub const fn at(&self, level: PageLevel) -> usize {
        self.indices[level as usize] as usize
    }

    /// Byte offset within the 4 KiB page.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_higher_half() {
        let idx = PageIndex::of(VirtualAddress::new(0xFFFF_FFFF_8000_1234));
        assert_eq!(idx.at(PageLevel::L4), 511);
        assert_eq!(idx.at(PageLevel::L3), 510);
        assert_eq!(idx.at(PageLevel::L2), 0);
        assert_eq!(idx.at(PageLevel::L1), 1);
        assert_eq!(idx.offset(), 0x234);
    }

    #[test]
    fn decompose_hhdm_base() {
        let idx = PageIndex::of(VirtualAddress::new(0xFFFF_8000_0000_0000));
        assert_eq!(idx.at(PageLevel::L4), 256);
        for level in [PageLevel::L3, PageLevel::L2, PageLevel::L1] {
            assert_eq!(idx.at(level), 0);
        }
    }

    #[test]
    fn level_order() {
        assert_eq!(PageLevel::L4.next(), Some(PageLevel::L3));
        assert_eq!(PageLevel::L1.next(), None);
        assert_eq!(PageLevel::L2.entry_span(), 2 * 1024 * 1024);
        assert_eq!(PageLevel::L3.to_string(), "L3");
    }

    #[test]
    fn table_is_one_frame() {
        let mut t = PageTable::zeroed();
        assert_eq!(core::mem::align_of::<PageTable>(), 4096);
        assert_eq!(t.present_count(), 0);
        t.set(3, PageTableEntry::new().with_present(true));
        assert_eq!(t.present_count(), 1);
        t.zero();
        assert_eq!(t.present_count(), 0);
    }
}
