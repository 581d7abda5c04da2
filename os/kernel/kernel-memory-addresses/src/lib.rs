//! # Typed Physical and Virtual Addresses
//!
//! The CPU sees every address as a `u64`. The frame allocator, the page-table
//! mapper and the scheduler do not: a physical frame handed to code expecting
//! a virtual pointer is a page-table corruption waiting to happen. This crate
//! gives the two spaces distinct `#[repr(transparent)]` types.
//!
//! | Type | Space | Notes |
//! |------|-------|-------|
//! | [`PhysicalAddress`] | physical | any byte address |
//! | [`PhysicalPage<S>`] | physical | aligned page of granule `S`; with [`Size4K`] a frame |
//! | [`VirtualAddress`] | virtual | translated through the active page tables |
//!
//! ```rust
//! use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
//!
//! let frame = PhysicalAddress::new(0x10_0042).page::<Size4K>();
//! assert_eq!(frame.frame_index(), 0x100);
//! assert_eq!(frame, PhysicalPage::from_frame_index(0x100));
//! assert_eq!(frame.base().as_u64(), 0x10_0000);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod granule;
mod physical;
mod virt;

pub use granule::{PageSize, Size4K};
pub use physical::{PhysicalAddress, PhysicalPage};
pub use virt::VirtualAddress;
