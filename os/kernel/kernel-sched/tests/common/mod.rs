//! Host stand-ins for the frame source, the direct map and the MMU.

#![allow(dead_code)]

use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K, VirtualAddress};
use kernel_sched::Scheduler;
use kernel_sync::InterruptControl;
use kernel_vmem::{FrameAlloc, Mmu, PhysMapper};
use log::{LevelFilter, Log, Metadata, Record};
use std::cell::{Cell, RefCell};
use std::sync::Once;

pub const DIRECT_MAP: u64 = 0xffff_8000_0000_0000;

thread_local! {
    static IF: Cell<bool> = const { Cell::new(true) };
    static MASKINGS: Cell<u32> = const { Cell::new(0) };
    static FLAG_AT_LOG: RefCell<Vec<bool>> = const { RefCell::new(Vec::new()) };
}

/// Thread-local interrupt flag that counts how often it was cleared.
pub struct FakeIrq;

impl InterruptControl for FakeIrq {
    fn are_enabled() -> bool {
        IF.with(Cell::get)
    }

    fn disable() {
        MASKINGS.with(|m| m.set(m.get() + 1));
        IF.with(|f| f.set(false));
    }

    fn enable() {
        IF.with(|f| f.set(true));
    }
}

pub type TestScheduler = Scheduler<FakeIrq>;

/// Snapshots the calling thread's [`FakeIrq`] flag on every log record.
///
/// The scheduler logs while it holds the run queue, so the snapshots show
/// whether interrupts were masked at that point.
struct FlagAtLog;

impl Log for FlagAtLog {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, _: &Record) {
        FLAG_AT_LOG.with(|v| v.borrow_mut().push(FakeIrq::are_enabled()));
    }

    fn flush(&self) {}
}

/// Install [`FlagAtLog`] once per test binary and clear this thread's history.
pub fn trace_interrupt_flag() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        log::set_logger(&FlagAtLog).expect("no other logger in this binary");
        log::set_max_level(LevelFilter::Trace);
    });
    MASKINGS.with(|m| m.set(0));
    FLAG_AT_LOG.with(|v| v.borrow_mut().clear());
}

/// How often [`FakeIrq::disable`] ran on this thread since the last reset.
pub fn maskings() -> u32 {
    MASKINGS.with(Cell::get)
}

/// Interrupt flag at each log record on this thread since the last reset.
pub fn flag_at_log() -> Vec<bool> {
    FLAG_AT_LOG.with(|v| v.borrow().clone())
}

/// Hands out consecutive frame numbers up to a limit.
pub struct CountingFrames {
    next: u64,
    end: u64,
}

impl CountingFrames {
    pub fn range(first: u64, count: u64) -> Self {
        Self {
            next: first,
            end: first + count,
        }
    }
}

impl FrameAlloc for CountingFrames {
    type Error = ();

    fn alloc_4k(&mut self) -> Option<PhysicalPage<Size4K>> {
        (self.next < self.end).then(|| {
            self.next += 1;
            PhysicalPage::from_frame_index(self.next - 1)
        })
    }

    fn free_4k(&mut self, _frame: PhysicalPage<Size4K>) -> Result<(), ()> {
        Ok(())
    }
}

/// Address arithmetic only; nothing is dereferenced.
pub struct OffsetMapper;

impl PhysMapper for OffsetMapper {
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        VirtualAddress::new(DIRECT_MAP + pa.as_u64())
    }
}

/// Reports a fixed active root.
pub struct FixedMmu(pub PhysicalPage<Size4K>);

impl Mmu for FixedMmu {
    fn active_root(&self) -> PhysicalPage<Size4K> {
        self.0
    }

    unsafe fn activate(&self, _root: PhysicalPage<Size4K>) {
        unreachable!("tasks are only created, never activated");
    }

    fn invalidate_page(&self, _va: VirtualAddress) {}
}

pub extern "C" fn entry_a() -> ! {
    unreachable!("task A is never run on the host")
}

pub extern "C" fn entry_b() -> ! {
    unreachable!("task B is never run on the host")
}

pub extern "C" fn entry_c() -> ! {
    unreachable!("task C is never run on the host")
}
