use kernel_alloc::LockedFrameAllocator;
use kernel_memory_addresses::PhysicalAddress;
use kernel_sync::InterruptControl;
use kernel_vmem::FrameAlloc;
use std::cell::Cell;

thread_local! {
    static IF: Cell<bool> = const { Cell::new(true) };
    static DISABLES: Cell<u32> = const { Cell::new(0) };
}

struct FakeIrq;

impl InterruptControl for FakeIrq {
    fn are_enabled() -> bool {
        IF.with(Cell::get)
    }

    fn disable() {
        DISABLES.with(|d| d.set(d.get() + 1));
        IF.with(|f| f.set(false));
    }

    fn enable() {
        IF.with(|f| f.set(true));
    }
}

type Frames = LockedFrameAllocator<FakeIrq, 16>;

#[test]
fn operations_run_with_interrupts_masked() {
    let frames = Frames::new();
    frames.init(1024);
    frames.mark_region_free(PhysicalAddress::new(0), 8 * 4096);

    DISABLES.with(|d| d.set(0));
    let observed = frames.with(|a| {
        assert!(!FakeIrq::are_enabled());
        a.free_count()
    });
    assert_eq!(observed, 8);
    assert!(FakeIrq::are_enabled());
    assert_eq!(DISABLES.with(Cell::get), 1);
}

#[test]
fn masked_caller_stays_masked() {
    let frames = Frames::new();
    frames.init(64);
    frames.mark_region_free(PhysicalAddress::new(0), 4096);

    IF.with(|f| f.set(false));
    assert!(frames.allocate().is_some());
    assert!(!FakeIrq::are_enabled());
    IF.with(|f| f.set(true));
}

#[test]
fn shared_reference_is_a_frame_source() {
    static FRAMES: Frames = Frames::new();
    FRAMES.init(64);
    FRAMES.mark_region_free(PhysicalAddress::new(0x1000), 2 * 4096);

    let mut source = &FRAMES;
    let a = source.alloc_4k().unwrap();
    let b = source.alloc_4k().unwrap();
    assert_ne!(a, b);
    assert_eq!(source.alloc_4k(), None);
    assert_eq!(FRAMES.used_count(), 64);

    source.free_4k(a).unwrap();
    assert_eq!(FRAMES.free_count(), 1);
    assert!(!FRAMES.is_frame_used(a));
    assert_eq!(FRAMES.free_count() + FRAMES.used_count(), FRAMES.total_frames());
}
