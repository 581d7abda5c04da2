//! # Interrupt-safe Frame Allocator
//!
//! The timer interrupt path and normal kernel code both allocate frames, so
//! every operation runs under a [`SpinMutex`] with interrupts masked through
//! the [`InterruptControl`] chosen by `I`.

use crate::frame_alloc::{BitmapFrameAllocator, FrameError};
use core::marker::PhantomData;
use kernel_info::boot::MemoryRegion;
use kernel_info::memory::BITMAP_WORDS;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
use kernel_sync::{InterruptControl, SpinMutex};
use kernel_vmem::FrameAlloc;

/// A [`BitmapFrameAllocator`] shareable between threads of control.
///
/// `&LockedFrameAllocator` implements [`FrameAlloc`], so a shared static can
/// be handed straight to the page table mapper.
pub struct LockedFrameAllocator<I, const WORDS: usize = BITMAP_WORDS> {
    inner: SpinMutex<BitmapFrameAllocator<WORDS>>,
    _irq: PhantomData<fn() -> I>,
}

impl<I: InterruptControl, const WORDS: usize> Default for LockedFrameAllocator<I, WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: InterruptControl, const WORDS: usize> LockedFrameAllocator<I, WORDS> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: SpinMutex::new(BitmapFrameAllocator::new()),
            _irq: PhantomData,
        }
    }

    /// Run `f` on the allocator with the lock held and interrupts disabled.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut BitmapFrameAllocator<WORDS>) -> R) -> R {
        let mut guard = self.inner.lock_irq_with::<I>();
        f(&mut guard)
    }

    /// See [`BitmapFrameAllocator::init`].
    pub fn init(&self, capacity: usize) {
        self.with(|a| a.init(capacity));
    }

    /// See [`BitmapFrameAllocator::seed_from_memory_map`].
    pub fn seed_from_memory_map(&self, regions: &[MemoryRegion]) -> usize {
        self.with(|a| a.seed_from_memory_map(regions))
    }

    pub fn mark_region_free(&self, base: PhysicalAddress, size: u64) -> usize {
        self.with(|a| a.mark_region_free(base, size))
    }

    pub fn reserve_region(&self, base: PhysicalAddress, size: u64) -> usize {
        self.with(|a| a.reserve_region(base, size))
    }

    pub fn allocate(&self) -> Option<PhysicalPage<Size4K>> {
        self.with(BitmapFrameAllocator::allocate)
    }

    pub fn allocate_contiguous(&self, count: usize) -> Option<PhysicalPage<Size4K>> {
        self.with(|a| a.allocate_contiguous(count))
    }

    /// # Errors
    /// See [`BitmapFrameAllocator::free`].
    pub fn free(&self, frame: PhysicalPage<Size4K>) -> Result<(), FrameError> {
        self.with(|a| a.free(frame))
    }

    /// # Errors
    /// See [`BitmapFrameAllocator::free_contiguous`].
    pub fn free_contiguous(
        &self,
        first: PhysicalPage<Size4K>,
        count: usize,
    ) -> Result<(), FrameError> {
        self.with(|a| a.free_contiguous(first, count))
    }

    pub fn free_count(&self) -> usize {
        self.with(|a| a.free_count())
    }

    pub fn used_count(&self) -> usize {
        self.with(|a| a.used_count())
    }

    pub fn total_frames(&self) -> usize {
        self.with(|a| a.total_frames())
    }

    pub fn is_frame_used(&self, frame: PhysicalPage<Size4K>) -> bool {
        self.with(|a| a.is_frame_used(frame))
    }
}

impl<I: InterruptControl, const WORDS: usize> FrameAlloc for &LockedFrameAllocator<I, WORDS> {
    type Error = FrameError;

    #[inline]
    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>> {
        self.allocate()
    }

    #[inline]
    fn free_4k(&mut self, frame: PhysicalPage<Size4K>) -> Result<(), Self::Error> {
        self.free(frame)
    }
}
