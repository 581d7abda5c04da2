use core::fmt::Debug;

mod sealed {
    pub trait Sealed {}
}

/// A mapping granule the memory core understands.
///
/// Only [`Size4K`] exists: frames, page-table leaves and task stacks are all
/// 4 KiB. Keeping the granule a type parameter lets [`PhysicalPage`] carry it
/// without every caller spelling out shifts and masks.
///
/// [`PhysicalPage`]: crate::PhysicalPage
pub trait PageSize: sealed::Sealed + Copy + Eq + Ord + Debug + 'static {
    /// Number of low address bits inside one granule.
    const SHIFT: u32;
    /// Bytes per granule.
    const SIZE: u64 = 1 << Self::SHIFT;
    /// Mask selecting the in-granule offset.
    const MASK: u64 = Self::SIZE - 1;
    /// Short label used by `Display` impls.
    const LABEL: &'static str;
}

/// The 4 KiB granule.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size4K;

impl sealed::Sealed for Size4K {}

impl PageSize for Size4K {
    const SHIFT: u32 = 12;
    const LABEL: &'static str = "4K";
}

const _: () = assert!(Size4K::SIZE == 4096);

/// `value` rounded down to a multiple of `S::SIZE`.
#[inline]
pub(crate) const fn round_down<S: PageSize>(value: u64) -> u64 {
    value & !S::MASK
}
