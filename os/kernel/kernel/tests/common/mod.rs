//! Host stand-ins for physical memory, the interrupt flag and the MMU.

#![allow(dead_code)]

use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K, VirtualAddress};
use kernel_sync::InterruptControl;
use kernel_vmem::{Mmu, PhysMapper};
use std::cell::Cell;

thread_local! {
    static IF: Cell<bool> = const { Cell::new(false) };
}

pub struct FakeIrq;

impl InterruptControl for FakeIrq {
    fn are_enabled() -> bool {
        IF.with(Cell::get)
    }

    fn disable() {
        IF.with(|f| f.set(false));
    }

    fn enable() {
        IF.with(|f| f.set(true));
    }
}

#[repr(C, align(4096))]
pub struct Frame([u8; 4096]);

/// `len` frames of host memory standing in for physical address `0..len*4096`.
pub struct Arena {
    frames: Box<[Frame]>,
}

impl Arena {
    pub fn with_frames(len: usize) -> Self {
        Self {
            frames: (0..len).map(|_| Frame([0; 4096])).collect(),
        }
    }
}

impl PhysMapper for Arena {
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        assert!(
            pa.as_u64() < (self.frames.len() as u64) * 4096,
            "{pa:?} outside the test arena"
        );
        VirtualAddress::new(self.frames.as_ptr() as u64 + pa.as_u64())
    }
}

pub struct RecordingMmu {
    pub active: Cell<PhysicalPage<Size4K>>,
    pub activations: Cell<usize>,
}

impl RecordingMmu {
    pub fn new() -> Self {
        Self {
            active: Cell::new(PhysicalPage::from_frame_index(0)),
            activations: Cell::new(0),
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

    fn invalidate_page(&self, _va: VirtualAddress) {}
}

pub extern "C" fn idle() -> ! {
    unreachable!("idle is never entered on the host")
}

pub extern "C" fn worker() -> ! {
    unreachable!("worker is never entered on the host")
}
