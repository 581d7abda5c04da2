//! # Bitmap Physical Frame Allocator
//!
//! One bit per 4 KiB frame, stored in a fixed array of `u64` words; bit
//! `i % 64` of word `i / 64` describes frame `i`. A set bit means the frame
//! is in use (allocated, reserved or simply never reported as usable).
//!
//! Allocation is *next-fit*: the scan starts at the frame handed out last,
//! skips words that are completely used, and wraps around to frame 0 exactly
//! once before giving up.
//!
//! The allocator itself is not synchronized; share it through
//! [`LockedFrameAllocator`](crate::LockedFrameAllocator).

use kernel_info::boot::{MemoryRegion, MemoryRegionKind};
use kernel_info::memory::{BITMAP_WORDS, FRAME_SIZE};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
use kernel_vmem::FrameAlloc;
use log::{debug, info, warn};

const BITS: usize = u64::BITS as usize;

/// Why a frame could not be returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// The frame is already free.
    #[error("frame {0:?} is already free")]
    DoubleFree(PhysicalPage<Size4K>),

    /// The frame lies beyond the managed range.
    #[error("frame {0:?} is not managed by this allocator")]
    OutOfRange(PhysicalPage<Size4K>),
}

/// Next-fit bitmap allocator over `WORDS * 64` frames.
///
/// A freshly constructed allocator manages no frames; call
/// [`init`](Self::init) or [`seed_from_memory_map`](Self::seed_from_memory_map)
/// first.
pub struct BitmapFrameAllocator<const WORDS: usize = BITMAP_WORDS> {
    bitmap: [u64; WORDS],
    /// Number of frames under management; bits at and past it stay set.
    capacity: usize,
    /// Frame index of the last successful allocation.
    cursor: usize,
    free: usize,
    used: usize,
}

impl<const WORDS: usize> Default for BitmapFrameAllocator<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> BitmapFrameAllocator<WORDS> {
    /// Largest number of frames this bitmap can describe.
    pub const MAX_CAPACITY: usize = WORDS * BITS;

    /// An allocator managing zero frames.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bitmap: [0; WORDS],
            capacity: 0,
            cursor: 0,
            free: 0,
            used: 0,
        }
    }

    /// Reset to `capacity` frames, every one of them used.
    ///
    /// `capacity` is clamped to [`MAX_CAPACITY`](Self::MAX_CAPACITY).
    pub fn init(&mut self, capacity: usize) {
        let capacity = capacity.min(Self::MAX_CAPACITY);
        self.bitmap.fill(u64::MAX);
        self.capacity = capacity;
        self.cursor = 0;
        self.free = 0;
        self.used = capacity;
        debug!("frame bitmap reset: {capacity} frames, all used");
    }

    /// Reset to full capacity and release every [`Usable`](MemoryRegionKind::Usable)
    /// region of the boot memory map.
    ///
    /// Returns the number of free frames afterwards.
    pub fn seed_from_memory_map(&mut self, regions: &[MemoryRegion]) -> usize {
        self.init(Self::MAX_CAPACITY);
        for region in regions.iter().filter(|r| r.kind == MemoryRegionKind::Usable) {
            let released = self.mark_region_free(region.base, region.length);
            debug!(
                "usable {:?}..{:#x}: {released} frames",
                region.base,
                region.end()
            );
        }
        info!(
            "frame allocator: {} free, {} used of {} frames",
            self.free, self.used, self.capacity
        );
        self.free
    }

    /// Release every frame that lies *entirely* inside `[base, base + size)`.
    ///
    /// The start is rounded up and the end rounded down to frame boundaries.
    /// Frames already free or beyond capacity are skipped. Returns the number
    /// of frames whose state changed.
    pub fn mark_region_free(&mut self, base: PhysicalAddress, size: u64) -> usize {
        let first = base.as_u64().div_ceil(FRAME_SIZE);
        let end = base.as_u64().saturating_add(size) / FRAME_SIZE;
        let mut changed = 0;
        for i in self.frame_range(first, end) {
            if self.test(i) {
                self.clear(i);
                self.used -= 1;
                self.free += 1;
                changed += 1;
            }
        }
        changed
    }

    /// Mark every frame touched by `[base, base + size)` as used.
    ///
    /// The start is rounded down and the end rounded up, so partial frames at
    /// either edge are reserved. Returns the number of frames whose state
    /// changed.
    pub fn reserve_region(&mut self, base: PhysicalAddress, size: u64) -> usize {
        let first = base.as_u64() / FRAME_SIZE;
        let end = base.as_u64().saturating_add(size).div_ceil(FRAME_SIZE);
        let mut changed = 0;
        for i in self.frame_range(first, end) {
            if !self.test(i) {
                self.set(i);
                self.free -= 1;
                self.used += 1;
                changed += 1;
            }
        }
        changed
    }

    /// Allocate one frame, or `None` if none is free.
    pub fn allocate(&mut self) -> Option<PhysicalPage<Size4K>> {
        let found = self.find_free(self.cursor).or_else(|| {
            self.cursor = 0;
            self.find_free(0)
        });

        let Some(i) = found else {
            warn!("physical memory exhausted ({} frames in use)", self.used);
            return None;
        };

        self.set(i);
        self.free -= 1;
        self.used += 1;
        self.cursor = i;
        Some(Self::page(i))
    }

    /// Allocate `count` physically consecutive frames and return the first.
    ///
    /// Runs never wrap from the last frame back to frame 0. Returns `None` for
    /// `count == 0` or if no large enough run exists.
    pub fn allocate_contiguous(&mut self, count: usize) -> Option<PhysicalPage<Size4K>> {
        if count == 0 || count > self.free {
            return None;
        }

        let found = self.find_run(self.cursor, count).or_else(|| {
            self.cursor = 0;
            self.find_run(0, count)
        });

        let Some(first) = found else {
            warn!("no run of {count} free frames");
            return None;
        };

        for i in first..first + count {
            self.set(i);
        }
        self.free -= count;
        self.used += count;
        self.cursor = first + count - 1;
        Some(Self::page(first))
    }

    /// Return a single frame.
    ///
    /// # Errors
    /// - [`FrameError::OutOfRange`] if the frame is beyond capacity.
    /// - [`FrameError::DoubleFree`] if it is already free; nothing changes.
    pub fn free(&mut self, frame: PhysicalPage<Size4K>) -> Result<(), FrameError> {
        let i = self.index_of(frame)?;
        if !self.test(i) {
            return Err(FrameError::DoubleFree(frame));
        }
        self.clear(i);
        self.used -= 1;
        self.free += 1;
        Ok(())
    }

    /// Return `count` consecutive frames starting at `first`.
    ///
    /// # Errors
    /// The first failing [`free`](Self::free); frames before it are already
    /// released.
    pub fn free_contiguous(
        &mut self,
        first: PhysicalPage<Size4K>,
        count: usize,
    ) -> Result<(), FrameError> {
        let start = first.frame_index();
        for n in 0..count as u64 {
            self.free(PhysicalPage::from_frame_index(start + n))?;
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn free_count(&self) -> usize {
        self.free
    }

    #[inline]
    #[must_use]
    pub const fn used_count(&self) -> usize {
        self.used
    }

    /// Number of frames under management.
    #[inline]
    #[must_use]
    pub const fn total_frames(&self) -> usize {
        self.capacity
    }

    /// Whether `frame` is in use. Frames beyond capacity always are.
    #[must_use]
    pub fn is_frame_used(&self, frame: PhysicalPage<Size4K>) -> bool {
        self.index_of(frame).ok().is_none_or(|i| self.test(i))
    }

    fn index_of(&self, frame: PhysicalPage<Size4K>) -> Result<usize, FrameError> {
        usize::try_from(frame.frame_index())
            .ok()
            .filter(|&i| i < self.capacity)
            .ok_or(FrameError::OutOfRange(frame))
    }

    /// Frame indices `first..end`, clipped to capacity.
    fn frame_range(&self, first: u64, end: u64) -> core::ops::Range<usize> {
        let clip = |v: u64| usize::try_from(v).map_or(self.capacity, |v| v.min(self.capacity));
        clip(first)..clip(end)
    }

    /// First free frame at or after `start`.
    fn find_free(&self, start: usize) -> Option<usize> {
        if start >= self.capacity {
            return None;
        }

        let words = self.capacity.div_ceil(BITS);
        let first_word = start / BITS;
        for w in first_word..words {
            let mut free_bits = !self.bitmap[w];
            if w == first_word {
                free_bits &= u64::MAX << (start % BITS);
            }
            if free_bits == 0 {
                continue;
            }
            let i = w * BITS + free_bits.trailing_zeros() as usize;
            return (i < self.capacity).then_some(i);
        }
        None
    }

    /// First frame of a run of `count` free frames at or after `start`.
    fn find_run(&self, start: usize, count: usize) -> Option<usize> {
        let mut run = 0;
        let mut i = start;
        while i < self.capacity {
            if run == 0 && i % BITS == 0 && self.bitmap[i / BITS] == u64::MAX {
                i += BITS;
                continue;
            }
            if self.test(i) {
                run = 0;
            } else {
                run += 1;
                if run == count {
                    return Some(i + 1 - count);
                }
            }
            i += 1;
        }
        None
    }

    #[inline]
    const fn page(i: usize) -> PhysicalPage<Size4K> {
        PhysicalPage::from_frame_index(i as u64)
    }

    #[inline]
    const fn test(&self, i: usize) -> bool {
        self.bitmap[i / BITS] & (1 << (i % BITS)) != 0
    }

    #[inline]
    const fn set(&mut self, i: usize) {
        self.bitmap[i / BITS] |= 1 << (i % BITS);
    }

    #[inline]
    const fn clear(&mut self, i: usize) {
        self.bitmap[i / BITS] &= !(1 << (i % BITS));
    }
}

impl<const WORDS: usize> FrameAlloc for BitmapFrameAllocator<WORDS> {
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
