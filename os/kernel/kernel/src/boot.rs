//! Bring-up steps, independent of the global instances so they can run
//! against host stand-ins.

use crate::KernelError;
use kernel_alloc::LockedFrameAllocator;
use kernel_info::boot::{KernelImage, MemoryRegion};
use kernel_info::memory::kernel_virt_to_phys;
use kernel_memory_addresses::PhysicalAddress;
use kernel_sched::{Scheduler, Task, TaskEntry};
use kernel_sync::InterruptControl;
use kernel_vmem::{AddressSpace, FrameAlloc, Mmu, PhysMapper};
use log::{info, warn};

/// Seed `frames` from the memory map, keep the kernel image's frames out of
/// it, then build and activate the kernel address space with table frames
/// taken from it.
///
/// # Errors
/// [`KernelError::Map`] if the address space could not be built; the
/// previous address space stays active.
///
/// # Safety
/// See [`AddressSpace::init`]. `mapper` must already work before the switch,
/// i.e. the bootloader provides the same direct map.
pub unsafe fn build_address_space<'m, I, const WORDS: usize, M, U>(
    frames: &LockedFrameAllocator<I, WORDS>,
    memory_map: &[MemoryRegion],
    kernel_image: &KernelImage,
    mapper: &'m M,
    mmu: &'m U,
) -> Result<AddressSpace<'m, M, U>, KernelError>
where
    I: InterruptControl,
    M: PhysMapper,
    U: Mmu,
{
    frames.seed_from_memory_map(memory_map);
    if let Some(pa) = kernel_virt_to_phys(kernel_image.start.as_u64()) {
        let reserved = frames.reserve_region(PhysicalAddress::new(pa), kernel_image.len());
        if reserved > 0 {
            warn!("kernel image overlapped usable memory, reserved {reserved} frames");
        }
    }
    info!("{} frames available for the kernel", frames.free_count());

    let mut source = frames;
    let space = unsafe { AddressSpace::init(memory_map, kernel_image, &mut source, mapper, mmu)? };
    info!(
        "address space ready, {} frames left",
        frames.free_count()
    );
    Ok(space)
}

/// Register `idle` followed by `workers` with `scheduler`.
///
/// `idle` is registered first and therefore becomes the current task: the
/// code calling this is what gets saved into its slot on the first switch.
///
/// # Errors
/// The first task that could not be created or queued.
pub fn spawn_tasks<I, A, M, U>(
    scheduler: &Scheduler<I>,
    frames: &mut A,
    mapper: &M,
    mmu: &U,
    idle: TaskEntry,
    workers: &[TaskEntry],
) -> Result<usize, KernelError>
where
    I: InterruptControl,
    A: FrameAlloc,
    M: PhysMapper,
    U: Mmu,
{
    for &entry in core::iter::once(&idle).chain(workers) {
        let task = Task::create(entry, frames, mapper, mmu)?;
        scheduler.register_task(task)?;
    }

    let count = scheduler.task_count();
    info!(
        "{count} tasks queued, quantum {} ticks",
        scheduler.quantum()
    );
    Ok(count)
}
