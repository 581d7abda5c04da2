//! # Boot Memory Map
//!
//! The bootloader reports physical memory as a list of [`MemoryRegion`]s. The
//! frame allocator releases the [`Usable`](MemoryRegionKind::Usable) ones, and
//! the address space mapper direct-maps every kind for which
//! [`MemoryRegionKind::is_direct_mapped`] holds.

use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Classification of a physical memory range.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MemoryRegionKind {
    /// Free RAM the allocator may hand out.
    Usable,
    /// Firmware or device reserved; never touched.
    Reserved,
    /// ACPI tables that can be reclaimed after parsing.
    AcpiReclaimable,
    /// ACPI non-volatile storage.
    AcpiNvs,
    /// Memory the bootloader used and the kernel may reclaim.
    BootloaderReclaimable,
    /// The kernel image and loaded modules.
    KernelAndModules,
    /// Linear framebuffer.
    Framebuffer,
    /// Defective RAM.
    BadMemory,
}

impl MemoryRegionKind {
    /// Whether regions of this kind are mapped into the higher half direct map.
    #[must_use]
    pub const fn is_direct_mapped(self) -> bool {
        matches!(
            self,
            Self::Usable
                | Self::BootloaderReclaimable
                | Self::AcpiReclaimable
                | Self::KernelAndModules
                | Self::Framebuffer
        )
    }
}

/// One entry of the boot memory map.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryRegion {
    pub base: PhysicalAddress,
    /// Length in bytes.
    pub length: u64,
    pub kind: MemoryRegionKind,
}

impl MemoryRegion {
    #[must_use]
    pub const fn new(base: u64, length: u64, kind: MemoryRegionKind) -> Self {
        Self {
            base: PhysicalAddress::new(base),
            length,
            kind,
        }
    }

    /// Exclusive end address, saturating at `u64::MAX`.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.base.as_u64().saturating_add(self.length)
    }
}

/// The linked virtual range of the kernel image, `[start, end)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KernelImage {
    pub start: VirtualAddress,
    pub end: VirtualAddress,
}

impl KernelImage {
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self {
            start: VirtualAddress::new(start),
            end: VirtualAddress::new(end),
        }
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.as_u64().saturating_sub(self.start.as_u64())
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_mapped_kinds() {
        assert!(MemoryRegionKind::Usable.is_direct_mapped());
        assert!(MemoryRegionKind::Framebuffer.is_direct_mapped());
        assert!(MemoryRegionKind::KernelAndModules.is_direct_mapped());
        assert!(!MemoryRegionKind::Reserved.is_direct_mapped());
        assert!(!MemoryRegionKind::AcpiNvs.is_direct_mapped());
        assert!(!MemoryRegionKind::BadMemory.is_direct_mapped());
    }

    #[test]
    fn region_end_saturates() {
        let r = MemoryRegion::new(u64::MAX - 10, 100, MemoryRegionKind::Reserved);
        assert_eq!(r.end(), u64::MAX);
        let r = MemoryRegion::new(0x1000, 0x2000, MemoryRegionKind::Usable);
        assert_eq!(r.end(), 0x3000);
    }

    #[test]
    fn kernel_image_len() {
        let img = KernelImage::new(0xffff_ffff_8000_0000, 0xffff_ffff_8000_3000);
        assert_eq!(img.len(), 0x3000);
        assert!(!img.is_empty());
        assert!(KernelImage::new(5, 5).is_empty());
    }
}
