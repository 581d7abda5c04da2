use super::AddressSpace;
use crate::{FrameAlloc, MapError, Mmu, PageFlags, PhysMapper};
use kernel_info::boot::{KernelImage, MemoryRegion};
use kernel_info::memory::{HHDM_BASE, kernel_virt_to_phys};
use kernel_memory_addresses::{PhysicalAddress, Size4K, VirtualAddress};
use log::{debug, info};

const PAGE: u64 = 4096;

impl<'m, M: PhysMapper, U: Mmu> AddressSpace<'m, M, U> {
    /// Build the kernel address space and switch to it.
    ///
    /// 1. Allocates and zeroes a fresh root.
    /// 2. Maps every frame of each direct-mapped region (see
    ///    [`MemoryRegionKind::is_direct_mapped`](kernel_info::boot::MemoryRegionKind::is_direct_mapped))
    ///    at `HHDM_BASE + phys`, present and writable.
    /// 3. Maps the kernel image at its linked addresses, backed by
    ///    `PHYS_LOAD + (virt - KERNEL_BASE)`.
    /// 4. Activates the new root.
    ///
    /// # Errors
    /// The first [`MapError`] encountered. The new root is never activated
    /// in that case.
    ///
    /// # Safety
    /// The kernel image, its stack and the structures it uses must be covered
    /// by `kernel_image` and the direct map, and `mapper` must stay valid
    /// under the new tables (the HHDM mapper does).
    pub unsafe fn init<A: FrameAlloc>(
        memory_map: &[MemoryRegion],
        kernel_image: &KernelImage,
        alloc: &mut A,
        mapper: &'m M,
        mmu: &'m U,
    ) -> Result<Self, MapError> {
        let space = Self::new(mapper, mmu, alloc)?;
        info!("building kernel address space, root at {:?}", space.root());

        let mut direct = 0u64;
        for region in memory_map.iter().filter(|r| r.kind.is_direct_mapped()) {
            direct += space.map_direct(region, alloc)?;
        }
        info!("direct map: {direct} pages at {HHDM_BASE:#x}");

        let image = space.map_kernel_image(kernel_image, alloc)?;
        info!(
            "kernel image: {image} pages at {:?}..{:?}",
            kernel_image.start, kernel_image.end
        );

        unsafe { space.activate() };
        info!("kernel address space active");
        Ok(space)
    }

    /// Map one region into the direct map, one page at a time.
    fn map_direct<A: FrameAlloc>(&self, region: &MemoryRegion, alloc: &mut A) -> Result<u64, MapError> {
        let start = region.base.page::<Size4K>().base().as_u64();
        let end = region
            .end()
            .checked_next_multiple_of(PAGE)
            .unwrap_or(u64::MAX & !(PAGE - 1));

        let mut pages = 0;
        let mut pa = start;
        while pa < end {
            let va = HHDM_BASE.checked_add(pa).map(VirtualAddress::new).ok_or(
                MapError::AddressOverflow {
                    va: VirtualAddress::new(HHDM_BASE),
                },
            )?;
            self.map(va, PhysicalAddress::new(pa), PageFlags::WRITABLE, alloc)?;
            pa += PAGE;
            pages += 1;
        }

        debug!(
            "direct-mapped {:?} {:#x}..{:#x} ({pages} pages)",
            region.kind, start, end
        );
        Ok(pages)
    }

    fn map_kernel_image<A: FrameAlloc>(&self, image: &KernelImage, alloc: &mut A) -> Result<u64, MapError> {
        let start = image.start.align_down::<Size4K>().as_u64();
        let end = image.end.as_u64().next_multiple_of(PAGE);

        let mut pages = 0;
        let mut va = start;
        while va < end {
            let virt = VirtualAddress::new(va);
            let pa = kernel_virt_to_phys(va).ok_or(MapError::OutsideKernelImage { va: virt })?;
            self.map(virt, PhysicalAddress::new(pa), PageFlags::WRITABLE, alloc)?;
            va += PAGE;
            pages += 1;
        }
        Ok(pages)
    }
}
