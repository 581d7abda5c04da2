//! # HHDM-based PhysMapper for Kernel Virtual Memory
//!
//! Once the kernel address space is active every direct-mapped frame is
//! visible at `HHDM_BASE + pa`. Page tables, task stacks and anything else
//! the kernel only knows by physical address are reached through this view.
//!
//! ## Example
//! ```rust
//! use kernel_alloc::phys_mapper::HhdmPhysMapper;
//! use kernel_memory_addresses::PhysicalAddress;
//! use kernel_vmem::PhysMapper;
//!
//! let va = HhdmPhysMapper.phys_to_virt(PhysicalAddress::new(0x1234_0000));
//! assert_eq!(va.as_u64(), 0xffff_8000_1234_0000);
//! ```

use kernel_info::memory::HHDM_BASE;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_vmem::PhysMapper;

/// [`PhysMapper`] for a kernel with a higher-half direct map.
///
/// Dereferencing through it is only sound while the direct map covers the
/// frame, i.e. after [`AddressSpace::init`](kernel_vmem::AddressSpace::init)
/// or under a bootloader that provides the same mapping.
#[derive(Debug, Default, Copy, Clone)]
pub struct HhdmPhysMapper;

impl PhysMapper for HhdmPhysMapper {
    #[inline]
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        VirtualAddress::new(HHDM_BASE + pa.as_u64())
    }
}
