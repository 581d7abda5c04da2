mod common;

use common::{Arena, RecordingMmu, TestFrames};
use kernel_info::boot::{KernelImage, MemoryRegion, MemoryRegionKind};
use kernel_info::memory::{HHDM_BASE, KERNEL_BASE, PHYS_LOAD};
use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, VirtualAddress};
use kernel_vmem::{AddressSpace, MapError, PageLevel};

fn memory_map() -> Vec<MemoryRegion> {
    vec![
        MemoryRegion::new(0x0, 0x8000, MemoryRegionKind::Usable),
        MemoryRegion::new(0x8000, 0x2000, MemoryRegionKind::Reserved),
        MemoryRegion::new(0xA000, 0x1000, MemoryRegionKind::AcpiNvs),
        MemoryRegion::new(0x10_0000, 0x3000, MemoryRegionKind::KernelAndModules),
        MemoryRegion::new(0x20_0000, 0x2000, MemoryRegionKind::BootloaderReclaimable),
        MemoryRegion::new(0xFD00_0000, 0x1000, MemoryRegionKind::Framebuffer),
        MemoryRegion::new(0x30_0000, 0x1000, MemoryRegionKind::BadMemory),
    ]
}

fn image() -> KernelImage {
    KernelImage::new(KERNEL_BASE, KERNEL_BASE + 0x2800)
}

fn hhdm(pa: u64) -> VirtualAddress {
    VirtualAddress::new(HHDM_BASE + pa)
}

#[test]
fn maps_every_frame_of_usable_regions() {
    let arena = Arena::with_frames(32);
    let mut frames = TestFrames::range(1, 31);
    let mmu = RecordingMmu::new(PhysicalPage::from_frame_index(0));

    let space = unsafe { AddressSpace::init(&memory_map(), &image(), &mut frames, &arena, &mmu) }
        .unwrap();

    // no page skipped
    for pa in (0..0x8000).step_by(0x1000) {
        assert_eq!(
            space.translate(hhdm(pa)),
            Some(PhysicalAddress::new(pa)),
            "frame {pa:#x} must be direct-mapped"
        );
    }
    assert_eq!(space.translate(hhdm(0x1234)), Some(PhysicalAddress::new(0x1234)));
}

#[test]
fn maps_only_direct_mapped_kinds() {
    let arena = Arena::with_frames(32);
    let mut frames = TestFrames::range(1, 31);
    let mmu = RecordingMmu::new(PhysicalPage::from_frame_index(0));

    let space = unsafe { AddressSpace::init(&memory_map(), &image(), &mut frames, &arena, &mmu) }
        .unwrap();

    for pa in [0x10_0000, 0x10_2000, 0x20_1000, 0xFD00_0000] {
        assert_eq!(space.translate(hhdm(pa)), Some(PhysicalAddress::new(pa)));
    }
    for pa in [0x8000, 0x9000, 0xA000, 0x30_0000] {
        assert_eq!(space.translate(hhdm(pa)), None, "{pa:#x} must stay unmapped");
    }
}

#[test]
fn maps_kernel_image_at_load_offset() {
    let arena = Arena::with_frames(32);
    let mut frames = TestFrames::range(1, 31);
    let mmu = RecordingMmu::new(PhysicalPage::from_frame_index(0));

    let space = unsafe { AddressSpace::init(&memory_map(), &image(), &mut frames, &arena, &mmu) }
        .unwrap();

    for off in [0, 0x1000, 0x2000, 0x2FFF] {
        assert_eq!(
            space.translate(VirtualAddress::new(KERNEL_BASE + off)),
            Some(PhysicalAddress::new(PHYS_LOAD + off))
        );
    }
    assert_eq!(space.translate(VirtualAddress::new(KERNEL_BASE + 0x3000)), None);
}

#[test]
fn activates_the_new_root() {
    let arena = Arena::with_frames(32);
    let mut frames = TestFrames::range(1, 31);
    let mmu = RecordingMmu::new(PhysicalPage::from_frame_index(0));

    let space = unsafe { AddressSpace::init(&memory_map(), &image(), &mut frames, &arena, &mmu) }
        .unwrap();

    assert_eq!(mmu.activations.get(), 1);
    assert_eq!(mmu.active.get(), space.root());
    assert!(space.is_active());
}

#[test]
fn unaligned_region_covers_partial_frames() {
    let arena = Arena::with_frames(16);
    let mut frames = TestFrames::range(1, 15);
    let mmu = RecordingMmu::new(PhysicalPage::from_frame_index(0));
    let map = [MemoryRegion::new(0x1800, 0x1000, MemoryRegionKind::Usable)];

    let space = unsafe {
        AddressSpace::init(&map, &KernelImage::new(KERNEL_BASE, KERNEL_BASE), &mut frames, &arena, &mmu)
    }
    .unwrap();

    assert_eq!(space.translate(hhdm(0x1000)), Some(PhysicalAddress::new(0x1000)));
    assert_eq!(space.translate(hhdm(0x2000)), Some(PhysicalAddress::new(0x2000)));
    assert_eq!(space.translate(hhdm(0x3000)), None);
}

#[test]
fn kernel_image_below_link_base_is_rejected() {
    let arena = Arena::with_frames(16);
    let mut frames = TestFrames::range(1, 15);
    let mmu = RecordingMmu::new(PhysicalPage::from_frame_index(0));
    let bogus = KernelImage::new(0x40_0000, 0x40_1000);

    let res = unsafe { AddressSpace::init(&[], &bogus, &mut frames, &arena, &mmu) };
    assert!(matches!(res, Err(MapError::OutsideKernelImage { .. })));
    assert_eq!(mmu.activations.get(), 0);
}

#[test]
fn exhaustion_aborts_without_activation() {
    let arena = Arena::with_frames(4);
    let mut frames = TestFrames::range(1, 3);
    let mmu = RecordingMmu::new(PhysicalPage::from_frame_index(0));

    let res = unsafe { AddressSpace::init(&memory_map(), &image(), &mut frames, &arena, &mmu) };
    assert!(matches!(res, Err(MapError::OutOfMemory { level: PageLevel::L1 })));
    assert_eq!(mmu.activations.get(), 0);
    assert_eq!(mmu.active.get(), PhysicalPage::from_frame_index(0));
}
