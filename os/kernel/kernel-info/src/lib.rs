//! # Kernel Layout and Boot Interface
//!
//! Compile-time configuration shared by the frame allocator, the address
//! space mapper and the scheduler, plus the boot-time memory map types the
//! bootloader hands to the kernel.
//!
//! ## Modules
//!
//! * [`memory`]: virtual address space layout and frame bookkeeping bounds.
//! * [`sched`]: scheduling quantum, run-queue capacity and segment selectors.
//! * [`boot`]: the boot memory map ([`MemoryRegion`](boot::MemoryRegion)) and
//!   the kernel image description ([`KernelImage`](boot::KernelImage)).
//!
//! ## Virtual Memory Architecture
//!
//! ```text
//! Virtual Address Space Layout (64-bit):
//!
//! 0x0000_0000_0000_0000 ┌─────────────────────────────────┐
//!                       │         User Space              │
//! HHDM_BASE             ├─────────────────────────────────┤ 0xffff_8000_0000_0000
//!                       │   Higher Half Direct Mapping    │
//!                       │   (Physical Memory Access)      │
//! KERNEL_BASE           ├─────────────────────────────────┤ 0xffff_ffff_8000_0000
//!                       │       Kernel Text & Data        │
//! 0xFFFF_FFFF_FFFF_FFFF └─────────────────────────────────┘
//! ```
//!
//! The kernel image is loaded at [`PHYS_LOAD`](memory::PHYS_LOAD) and linked
//! at [`KERNEL_BASE`](memory::KERNEL_BASE), so a kernel virtual address `va`
//! is backed by `PHYS_LOAD + (va - KERNEL_BASE)`:
//!
//! ```rust
//! use kernel_info::memory::{kernel_virt_to_phys, KERNEL_BASE, PHYS_LOAD};
//!
//! assert_eq!(kernel_virt_to_phys(KERNEL_BASE + 0x2000), Some(PHYS_LOAD + 0x2000));
//! assert_eq!(kernel_virt_to_phys(0x1000), None);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
pub mod sched;
