use kernel_alloc::{BitmapFrameAllocator, FrameError};
use kernel_info::boot::{MemoryRegion, MemoryRegionKind};
use kernel_info::memory::MAX_FRAMES;
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
use kernel_vmem::FrameAlloc;
use std::collections::HashSet;

/// 16 Ki frames, 64 MiB of "RAM".
type Frames = BitmapFrameAllocator<256>;

fn boxed() -> Box<Frames> {
    Box::new(Frames::new())
}

fn assert_balanced<const W: usize>(a: &BitmapFrameAllocator<W>) {
    assert_eq!(a.free_count() + a.used_count(), a.total_frames());
}

#[test]
fn empty_init_has_nothing_to_give() {
    let mut a = boxed();
    a.init(0);
    assert_eq!(a.free_count(), 0);
    assert_eq!(a.allocate(), None);
    assert_balanced(&a);
}

#[test]
fn sixteen_frames_then_exhaustion() {
    let mut a = boxed();
    a.init(4096);
    assert_eq!(a.mark_region_free(PhysicalAddress::new(0x10_0000), 0x10000), 16);
    assert_eq!(a.free_count(), 16);

    let mut seen = HashSet::new();
    for _ in 0..16 {
        let f = a.allocate().expect("frame");
        let pa = f.base().as_u64();
        assert!((0x10_0000..0x11_0000).contains(&pa));
        assert!(seen.insert(pa), "{pa:#x} handed out twice");
        assert_balanced(&a);
    }
    assert_eq!(a.allocate(), None);
}

#[test]
fn exhaustion_is_stable() {
    let mut a = boxed();
    a.init(4096);
    a.mark_region_free(PhysicalAddress::new(0), 2 * 4096);
    a.allocate().unwrap();
    a.allocate().unwrap();
    assert_eq!(a.free_count(), 0);

    assert_eq!(a.allocate(), None);
    assert_eq!(a.allocate(), None);
    assert_eq!(a.free_count(), 0);
    assert_eq!(a.used_count(), 4096);
}

#[test]
fn allocate_free_round_trip() {
    let mut a = boxed();
    a.init(4096);
    a.mark_region_free(PhysicalAddress::new(0x20_0000), 0x8000);
    let before = a.free_count();

    let f = a.allocate().unwrap();
    assert!(a.is_frame_used(f));
    a.free(f).unwrap();

    assert_eq!(a.free_count(), before);
    assert!(!a.is_frame_used(f));
    assert_balanced(&a);
}

#[test]
fn bitmap_tracks_allocations() {
    let mut a = boxed();
    a.init(1024);
    a.mark_region_free(PhysicalAddress::new(0), 1024 * 4096);

    let taken: Vec<_> = (0..100).map(|_| a.allocate().unwrap()).collect();
    for f in taken.iter().step_by(2) {
        a.free(*f).unwrap();
    }

    for (n, f) in taken.iter().enumerate() {
        assert_eq!(a.is_frame_used(*f), n % 2 == 1, "frame {f:?}");
    }
    assert_eq!(a.used_count(), 50);
    assert_balanced(&a);
}

#[test]
fn next_fit_continues_after_last_grant() {
    let mut a = boxed();
    a.init(1024);
    a.mark_region_free(PhysicalAddress::new(0), 1024 * 4096);

    let first = a.allocate().unwrap();
    let second = a.allocate().unwrap();
    a.free(first).unwrap();

    // The freed frame lies behind the cursor and is not reused yet.
    let third = a.allocate().unwrap();
    assert_eq!(third.frame_index(), second.frame_index() + 1);
}

#[test]
fn wraps_to_the_start_once() {
    let mut a = boxed();
    a.init(128);
    a.mark_region_free(PhysicalAddress::new(0), 128 * 4096);
    let all: Vec<_> = (0..128).map(|_| a.allocate().unwrap()).collect();
    assert_eq!(all.last().unwrap().frame_index(), 127);

    a.free(all[5]).unwrap();
    assert_eq!(a.allocate(), Some(all[5]));
    assert_eq!(a.allocate(), None);
}

#[test]
fn contiguous_allocation() {
    let mut a = boxed();
    a.init(1024);
    a.mark_region_free(PhysicalAddress::new(0), 64 * 4096);
    a.reserve_region(PhysicalAddress::new(10 * 4096), 4096);

    let run = a.allocate_contiguous(16).unwrap();
    assert!(run.frame_index() > 10);
    for n in 0..16 {
        assert!(a.is_frame_used(PhysicalPage::from_frame_index(run.frame_index() + n)));
    }
    assert_eq!(a.allocate_contiguous(0), None);
    assert_eq!(a.allocate_contiguous(64), None);

    a.free_contiguous(run, 16).unwrap();
    assert_eq!(a.free_count(), 63);
}

#[test]
fn double_free_and_out_of_range() {
    let mut a = boxed();
    a.init(64);
    a.mark_region_free(PhysicalAddress::new(0), 64 * 4096);

    let f = a.allocate().unwrap();
    a.free(f).unwrap();
    assert_eq!(a.free(f), Err(FrameError::DoubleFree(f)));

    let far: PhysicalPage<Size4K> = PhysicalPage::from_frame_index(64);
    assert_eq!(a.free(far), Err(FrameError::OutOfRange(far)));
    assert_eq!(a.free_count(), 64);
}

#[test]
fn seeding_releases_only_usable_memory() {
    let map = [
        MemoryRegion::new(0, 0x9_F000, MemoryRegionKind::Usable),
        MemoryRegion::new(0x9_F000, 0x6_1000, MemoryRegionKind::Reserved),
        MemoryRegion::new(0x10_0000, 0x20_0000, MemoryRegionKind::KernelAndModules),
        MemoryRegion::new(0x30_0000, 0x10_0800, MemoryRegionKind::Usable),
        MemoryRegion::new(0x7FE_0000, 0x2_0000, MemoryRegionKind::AcpiReclaimable),
    ];

    let mut a = Box::new(BitmapFrameAllocator::<{ MAX_FRAMES / 64 }>::new());
    let free = a.seed_from_memory_map(&map);

    assert_eq!(a.total_frames(), MAX_FRAMES);
    assert_eq!(free, 0x9F + 0x100);
    assert!(a.is_frame_used(PhysicalAddress::new(0x10_0000).page()));
    assert!(!a.is_frame_used(PhysicalAddress::new(0x30_0000).page()));
    // The trailing half frame of the second usable region stays reserved.
    assert!(a.is_frame_used(PhysicalAddress::new(0x40_0000).page()));
    assert_balanced(&a);
}

#[test]
fn usable_through_the_frame_alloc_seam() {
    let mut a = boxed();
    a.init(64);
    a.mark_region_free(PhysicalAddress::new(0), 4096);

    let f = a.alloc_4k().unwrap();
    assert_eq!(a.alloc_4k(), None);
    a.free_4k(f).unwrap();
    assert!(a.free_4k(f).is_err());
}
