use crate::granule::{PageSize, Size4K, round_down};
use core::fmt;
use core::marker::PhantomData;

/// A byte address in physical memory.
///
/// Frames, page-table roots and MMIO live here. Nothing in this type says the
/// address is backed by RAM; it only keeps it from being handed to code that
/// expects a [`VirtualAddress`](crate::VirtualAddress).
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The frame this address falls into.
    #[inline]
    #[must_use]
    pub const fn page<S: PageSize>(self) -> PhysicalPage<S> {
        PhysicalPage::from_addr(self)
    }

    /// Byte offset of this address inside its frame.
    #[inline]
    #[must_use]
    pub const fn page_offset<S: PageSize>(self) -> u64 {
        self.0 & S::MASK
    }

    #[inline]
    #[must_use]
    pub const fn is_aligned<S: PageSize>(self) -> bool {
        self.page_offset::<S>() == 0
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, bytes: u64) -> Option<Self> {
        match self.0.checked_add(bytes) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA({:#018x})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// An aligned physical page of granule `S`.
///
/// `PhysicalPage<Size4K>` is what the rest of the kernel calls a frame: the
/// unit the bitmap allocator hands out and a page-table entry points at.
/// The base is aligned by construction.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage<S: PageSize> {
    base: u64,
    _granule: PhantomData<S>,
}

impl<S: PageSize> PhysicalPage<S> {
    /// The page containing `addr`.
    #[inline]
    #[must_use]
    pub const fn from_addr(addr: PhysicalAddress) -> Self {
        Self {
            base: round_down::<S>(addr.0),
            _granule: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress(self.base)
    }
}

impl PhysicalPage<Size4K> {
    /// Frame number, i.e. `base / 4096`. The bitmap allocator indexes by it.
    #[inline]
    #[must_use]
    pub const fn frame_index(self) -> u64 {
        self.base >> Size4K::SHIFT
    }

    #[inline]
    #[must_use]
    pub const fn from_frame_index(index: u64) -> Self {
        Self {
            base: index << Size4K::SHIFT,
            _granule: PhantomData,
        }
    }
}

impl<S: PageSize> fmt::Debug for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame<{}>({:#x})", S::LABEL, self.base)
    }
}

impl<S: PageSize> fmt::Display for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}/{}", self.base, S::LABEL)
    }
}

impl<S: PageSize> From<PhysicalPage<S>> for PhysicalAddress {
    #[inline]
    fn from(page: PhysicalPage<S>) -> Self {
        page.base()
    }
}
