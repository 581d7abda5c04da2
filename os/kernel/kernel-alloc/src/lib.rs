//! # Physical Frame Allocation
//!
//! Owns the record of which 4 KiB physical frames are in use and hands them
//! out to the address space mapper (page tables) and the scheduler (stacks).
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │           LockedFrameAllocator                      │
//! │    • SpinMutex + interrupts masked per operation    │
//! │    • Safe to share with the timer interrupt path    │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │           BitmapFrameAllocator                      │
//! │    • One bit per frame, 2^20 frames (4 GiB)         │
//! │    • Next-fit scan with a single wrap-around retry  │
//! │    • No heap, no per-frame metadata                 │
//! └─────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────┐
//! │           HhdmPhysMapper                            │
//! │    • Frame → HHDM_BASE + pa for table access        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! 1. Everything starts *used* ([`BitmapFrameAllocator::init`]).
//! 2. Ranges the boot memory map reports as usable are released
//!    ([`BitmapFrameAllocator::seed_from_memory_map`]).
//! 3. Frames are granted with [`allocate`](BitmapFrameAllocator::allocate)
//!    and returned with [`free`](BitmapFrameAllocator::free).
//!
//! ```rust
//! use kernel_alloc::frame_alloc::BitmapFrameAllocator;
//! use kernel_memory_addresses::PhysicalAddress;
//!
//! let mut frames = BitmapFrameAllocator::<64>::new();
//! frames.init(1024);
//! frames.mark_region_free(PhysicalAddress::new(0x10_0000), 0x10000);
//! assert_eq!(frames.free_count(), 16);
//!
//! let f = frames.allocate().unwrap();
//! assert_eq!(f.base().as_u64(), 0x10_0000);
//! frames.free(f).unwrap();
//! assert_eq!(frames.free_count(), 16);
//! ```
//!
//! ## Invariants
//!
//! * `free_count() + used_count() == total_frames()` after every operation.
//! * A frame's bit is set iff it was allocated (or never released) since the
//!   last `init`.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod frame_alloc;
pub mod locked;
pub mod phys_mapper;

pub use frame_alloc::{BitmapFrameAllocator, FrameError};
pub use locked::LockedFrameAllocator;
pub use phys_mapper::HhdmPhysMapper;
