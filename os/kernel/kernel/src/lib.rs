//! # Kernel Memory and Execution Core
//!
//! Ties the frame allocator, the page-table mapper and the scheduler together
//! and owns their single global instances.
//!
//! ## Bring-up
//!
//! ```text
//!  boot memory map ──▶ FRAMES.seed_from_memory_map
//!                            │
//!                            ▼
//!                     AddressSpace::init ──▶ CR3
//!                            │
//!                            ▼
//!   idle + workers ──▶ SCHEDULER.register_task
//!                            │
//!                            ▼
//!       timer_interrupt_entry ──▶ SCHEDULER.preempt ──▶ next task
//! ```
//!
//! The platform layer (GDT, IDT, interrupt controller) is outside this crate.
//! It routes the timer vector to [`timer::timer_interrupt_entry`] and
//! registers its end-of-interrupt routine with [`timer::set_eoi_hook`].

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod boot;
mod error;
pub mod tasks;
#[cfg(target_arch = "x86_64")]
pub mod timer;

pub use error::KernelError;

#[cfg(target_arch = "x86_64")]
pub use x86::{FRAMES, Kernel, KernelFrames, KernelScheduler, SCHEDULER};

#[cfg(target_arch = "x86_64")]
mod x86 {
    use crate::{KernelError, boot};
    use kernel_alloc::{HhdmPhysMapper, LockedFrameAllocator};
    use kernel_info::boot::{KernelImage, MemoryRegion};
    use kernel_info::sched::DEFAULT_QUANTUM_TICKS;
    use kernel_qemu::QemuLogger;
    use kernel_sched::{Scheduler, TaskEntry, idle};
    use kernel_sync::X86Interrupts;
    use kernel_vmem::{AddressSpace, X86Mmu};
    use log::{LevelFilter, error, info};

    pub type KernelFrames = LockedFrameAllocator<X86Interrupts>;
    pub type KernelScheduler = Scheduler<X86Interrupts>;

    /// Every physical frame the kernel hands out comes from here.
    pub static FRAMES: KernelFrames = KernelFrames::new();

    /// The run queue driven by the timer interrupt.
    pub static SCHEDULER: KernelScheduler = KernelScheduler::new(DEFAULT_QUANTUM_TICKS);

    static MAPPER: HhdmPhysMapper = HhdmPhysMapper;

    // SAFETY: only used from ring 0 once paging is on.
    static MMU: X86Mmu = unsafe { X86Mmu::new() };

    /// The running kernel: its address space, backed by the global
    /// allocator and scheduler.
    pub struct Kernel {
        space: AddressSpace<'static, HhdmPhysMapper, X86Mmu>,
    }

    impl Kernel {
        /// Install the debug logger, seed [`FRAMES`] and switch to the
        /// kernel's own address space.
        ///
        /// # Errors
        /// [`KernelError::Map`] if the address space could not be built.
        ///
        /// # Safety
        /// Call once, in ring 0, with interrupts disabled, while the
        /// bootloader's direct map at `HHDM_BASE` is still active.
        pub unsafe fn boot(
            memory_map: &[MemoryRegion],
            kernel_image: &KernelImage,
        ) -> Result<Self, KernelError> {
            // Ignored: a logger may already be installed.
            let _ = QemuLogger::new(LevelFilter::Debug).init();
            info!("kernel core starting, {} memory regions", memory_map.len());

            let space = unsafe {
                boot::build_address_space(&FRAMES, memory_map, kernel_image, &MAPPER, &MMU)?
            };
            Ok(Self { space })
        }

        #[must_use]
        pub const fn address_space(&self) -> &AddressSpace<'static, HhdmPhysMapper, X86Mmu> {
            &self.space
        }

        /// Queue the idle task and `workers`, then become the idle task.
        ///
        /// [`tasks::worker_task`](crate::tasks::worker_task) is a ready-made
        /// worker.
        ///
        /// The timer must be routed to
        /// [`timer_interrupt_entry`](crate::timer::timer_interrupt_entry)
        /// before calling this. Tasks that could not be created are logged;
        /// those queued before the failure still run.
        pub fn start_multitasking(&self, workers: &[TaskEntry]) -> ! {
            let mut frames = &FRAMES;
            match boot::spawn_tasks(
                &SCHEDULER,
                &mut frames,
                &MAPPER,
                &MMU,
                idle::idle_task,
                workers,
            ) {
                Ok(count) => info!("multitasking with {count} tasks"),
                Err(e) => error!("could not start every task: {e}"),
            }
            idle::halt_loop()
        }
    }
}
