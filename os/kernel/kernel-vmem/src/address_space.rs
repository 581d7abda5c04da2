//! # Address Space (x86-64, L4-rooted)
//!
//! A handle to one virtual address space: the physical frame of its L4 table
//! plus the [`PhysMapper`] used to reach table frames and the [`Mmu`] used to
//! activate it and keep the TLB coherent.
//!
//! ## Highlights
//!
//! - [`AddressSpace::translate`] walks present entries only and never allocates.
//! - [`AddressSpace::map`] installs one 4 KiB leaf, creating missing tables.
//!   Every missing table is reserved before the tree is touched, so a failed
//!   allocation leaves it exactly as it was.
//! - [`AddressSpace::map_range`] maps a byte range page by page.
//! - [`AddressSpace::init`] builds the kernel's address space from the boot
//!   memory map and switches to it.
//!
//! ## Safety
//!
//! The `PhysMapper` must yield **writable** views of every table frame; table
//! frames come from the caller's [`FrameAlloc`] and are never shared.

mod init;

use crate::{
    FrameAlloc, MapError, Mmu, PageFlags, PageIndex, PageLevel, PageTable, PageTableEntry,
    PhysMapper,
};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K, VirtualAddress};
use log::warn;

/// The L4 root page for an [`AddressSpace`].
pub type RootPage = PhysicalPage<Size4K>;

/// Handle to a single, concrete address space.
pub struct AddressSpace<'m, M: PhysMapper, U: Mmu> {
    root: RootPage,
    mapper: &'m M,
    mmu: &'m U,
}

impl<'m, M: PhysMapper, U: Mmu> AddressSpace<'m, M, U> {
    /// A fresh address space with an empty (zeroed) root table.
    ///
    /// # Errors
    /// [`MapError::OutOfMemory`] at [`PageLevel::L4`] if no frame is available.
    pub fn new<A: FrameAlloc>(mapper: &'m M, mmu: &'m U, alloc: &mut A) -> Result<Self, MapError> {
        let root = alloc
            .alloc_4k()
            .ok_or(MapError::OutOfMemory { level: PageLevel::L4 })?;
        let space = Self { root, mapper, mmu };
        space.table_mut(root).zero();
        Ok(space)
    }

    /// View the **currently active** address space.
    #[inline]
    pub fn from_current(mapper: &'m M, mmu: &'m U) -> Self {
        Self {
            root: mmu.active_root(),
            mapper,
            mmu,
        }
    }

    /// Wrap an already built root table.
    #[inline]
    pub const fn from_root(mapper: &'m M, mmu: &'m U, root: RootPage) -> Self {
        Self { root, mapper, mmu }
    }

    /// Physical frame of the L4 table; the value CR3 holds while active.
    #[inline]
    pub const fn root(&self) -> RootPage {
        self.root
    }

    /// Whether this address space is the one the MMU currently uses.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.mmu.active_root() == self.root
    }

    /// Make this the active address space.
    ///
    /// # Safety
    /// The tables must map the executing code, the current stack and every
    /// structure the kernel accesses afterwards.
    #[inline]
    pub unsafe fn activate(&self) {
        unsafe { self.mmu.activate(self.root) }
    }

    /// Borrow the table stored in `frame`.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub(crate) fn table_mut(&self, frame: RootPage) -> &'m mut PageTable {
        // SAFETY: table frames are owned by this address space and only ever
        // viewed as `PageTable`; the mapper yields writable views.
        unsafe { self.mapper.phys_to_mut::<PageTable>(frame.base()) }
    }

    /// Translate `va` to the physical address it maps to, if any.
    ///
    /// Follows present entries only. 2 MiB and 1 GiB leaves found at L2/L3
    /// are honored.
    #[must_use]
    pub fn translate(&self, va: VirtualAddress) -> Option<PhysicalAddress> {
        let idx = PageIndex::of(va);
        let mut table = self.root;

        for level in PageLevel::NON_LEAF {
            let e = self.table_mut(table).entry(idx.at(level));
            if !e.present() {
                return None;
            }
            if e.large_page() && level != PageLevel::L4 {
                let span = level.entry_span();
                let base = e.physical_address().as_u64() & !(span - 1);
                return Some(PhysicalAddress::new(base | (va.as_u64() & (span - 1))));
            }
            table = e.frame();
        }

        let leaf = self.table_mut(table).entry(idx.at(PageLevel::L1));
        if !leaf.present() {
            return None;
        }
        leaf.physical_address().checked_add(idx.offset())
    }

    /// Map the 4 KiB page at `va` to the frame at `pa` with `flags | PRESENT`.
    ///
    /// Missing intermediate tables are allocated from `alloc`, zeroed and
    /// linked present+writable (and user-accessible when `flags` contain
    /// [`PageFlags::USER`]). An existing leaf is overwritten; the frame it
    /// pointed to is not reclaimed. The TLB entry for `va` is invalidated.
    ///
    /// # Errors
    /// - [`MapError::Unaligned`] if `va` or `pa` is not 4 KiB aligned.
    /// - [`MapError::OutOfMemory`] if a table could not be allocated. Frames
    ///   reserved by this call go back to `alloc` and no entry is modified,
    ///   including the user bit of existing links.
    /// - [`MapError::LargePage`] if a 2 MiB or 1 GiB leaf already covers `va`.
    pub fn map<A: FrameAlloc>(
        &self,
        va: VirtualAddress,
        pa: PhysicalAddress,
        flags: PageFlags,
        alloc: &mut A,
    ) -> Result<(), MapError> {
        if !va.is_aligned::<Size4K>() || !pa.is_aligned::<Size4K>() {
            return Err(MapError::Unaligned { va, pa });
        }

        let user = flags.contains(PageFlags::USER);
        let idx = PageIndex::of(va);

        // Read-only pass: how deep does the existing tree reach?
        let mut walk = self.root;
        let mut depth = 0;
        for level in PageLevel::NON_LEAF {
            let e = self.table_mut(walk).entry(idx.at(level));
            if !e.present() {
                break;
            }
            if e.large_page() && level != PageLevel::L4 {
                return Err(MapError::LargePage { va, level });
            }
            walk = e.frame();
            depth += 1;
        }

        // Reserve every missing table before the tree is touched.
        let mut fresh = [PhysicalPage::from_frame_index(0); 3];
        for (i, level) in PageLevel::NON_LEAF.into_iter().enumerate().skip(depth) {
            let Some(frame) = alloc.alloc_4k() else {
                Self::release(&fresh[depth..i], alloc);
                let level = level.next().unwrap_or(PageLevel::L1);
                warn!("map {va:?}: no frame for {level} table");
                return Err(MapError::OutOfMemory { level });
            };
            fresh[i] = frame;
        }

        let mut table = self.root;
        for (i, level) in PageLevel::NON_LEAF.into_iter().enumerate() {
            let slot = idx.at(level);
            let parent = self.table_mut(table);
            table = if i < depth {
                let e = parent.entry(slot);
                if user && !e.user_access() {
                    parent.set(slot, e.with_user_access(true));
                }
                e.frame()
            } else {
                let frame = fresh[i];
                self.table_mut(frame).zero();
                parent.set(slot, PageTableEntry::table(frame, user));
                frame
            };
        }

        self.table_mut(table)
            .set(idx.at(PageLevel::L1), PageTableEntry::leaf(pa.page(), flags));
        self.mmu.invalidate_page(va);
        Ok(())
    }

    /// Map `len` bytes starting at `va` to `pa`, rounding up to whole pages.
    ///
    /// Stops at the first failing page; earlier pages stay mapped.
    ///
    /// # Errors
    /// As [`map`](Self::map), plus [`MapError::AddressOverflow`] if the range
    /// wraps around the address space.
    pub fn map_range<A: FrameAlloc>(
        &self,
        va: VirtualAddress,
        pa: PhysicalAddress,
        len: u64,
        flags: PageFlags,
        alloc: &mut A,
    ) -> Result<(), MapError> {
        const PAGE: u64 = 4096;
        for i in 0..len.div_ceil(PAGE) {
            let off = i * PAGE;
            let (Some(v), Some(p)) = (va.checked_add(off), pa.checked_add(off)) else {
                return Err(MapError::AddressOverflow { va });
            };
            self.map(v, p, flags, alloc)?;
        }
        Ok(())
    }

    /// Hand back frames reserved for tables that were never linked.
    fn release<A: FrameAlloc>(frames: &[RootPage], alloc: &mut A) {
        for &frame in frames {
            if let Err(e) = alloc.free_4k(frame) {
                warn!("leaked table frame {frame:?}: {e:?}");
            }
        }
    }
}
