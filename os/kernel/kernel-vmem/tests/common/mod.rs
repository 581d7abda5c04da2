//! Host stand-ins for physical memory, the frame source and the MMU.

#![allow(dead_code)]

use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K, VirtualAddress};
use kernel_vmem::{FrameAlloc, Mmu, PhysMapper};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// A 4 KiB-aligned raw frame; "physical RAM" in tests.
#[repr(C, align(4096))]
pub struct Frame([u8; 4096]);

/// Physical memory simulated as a heap allocation of frames.
///
/// Physical address `pa` lives at `base + pa`, so frame `n` is the `n`-th
/// element. The mapper hands out real host pointers.
pub struct Arena {
    base: *mut Frame,
    len: usize,
}

impl Arena {
    pub fn with_frames(len: usize) -> Self {
        let frames: Vec<Frame> = (0..len).map(|_| Frame([0; 4096])).collect();
        let base = Box::into_raw(frames.into_boxed_slice()).cast::<Frame>();
        Self { base, len }
    }

    pub fn frames(&self) -> usize {
        self.len
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                self.base, self.len,
            )));
        }
    }
}

impl PhysMapper for Arena {
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        assert!(
            pa.as_u64() < (self.len as u64) * 4096,
            "{pa:?} outside the test arena"
        );
        VirtualAddress::new(self.base as u64 + pa.as_u64())
    }
}

/// FIFO frame source over a fixed set of frame numbers.
pub struct TestFrames {
    free: VecDeque<PhysicalPage<Size4K>>,
}

impl TestFrames {
    /// Frames `first..first + count`.
    pub fn range(first: u64, count: u64) -> Self {
        Self {
            free: (first..first + count)
                .map(PhysicalPage::from_frame_index)
                .collect(),
        }
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

impl FrameAlloc for TestFrames {
    type Error = &'static str;

    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>> {
        self.free.pop_front()
    }

    fn free_4k(&mut self, frame: PhysicalPage<Size4K>) -> Result<(), Self::Error> {
        if self.free.contains(&frame) {
            return Err("double free");
        }
        self.free.push_front(frame);
        Ok(())
    }
}

/// Records every MMU interaction instead of touching CR3.
pub struct RecordingMmu {
    pub active: Cell<PhysicalPage<Size4K>>,
    pub activations: Cell<usize>,
    pub invalidated: RefCell<Vec<VirtualAddress>>,
}

impl RecordingMmu {
    pub fn new(active: PhysicalPage<Size4K>) -> Self {
        Self {
            active: Cell::new(active),
            activations: Cell::new(0),
            invalidated: RefCell::new(Vec::new()),
        }
    }
}

impl Mmu for RecordingMmu {
    fn active_root(&self) -> PhysicalPage<Size4K> {
        self.active.get()
    }

    unsafe fn activate(&self, root: PhysicalPage<Size4K>) {
        self.active.set(root);
        self.activations.set(self.activations.get() + 1);
    }

    fn invalidate_page(&self, va: VirtualAddress) {
        self.invalidated.borrow_mut().push(va);
    }
}
