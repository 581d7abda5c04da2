use crate::{TaskContext, TaskError};
use core::fmt;
use kernel_info::memory::FRAME_SIZE;
use kernel_info::sched::{KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR};
use kernel_memory_addresses::{PhysicalPage, Size4K};
use kernel_registers::rflags::Rflags;
use kernel_vmem::{FrameAlloc, Mmu, PhysMapper};
use log::debug;

/// Entry point of a kernel task. Tasks never return.
pub type TaskEntry = extern "C" fn() -> !;

/// Slot of a task in the scheduler's run queue.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A kernel task: its saved registers, its stack and its address space.
#[derive(Debug, Clone)]
pub struct Task {
    pub(crate) context: TaskContext,
    pub(crate) root: PhysicalPage<Size4K>,
    pub(crate) stack: PhysicalPage<Size4K>,
    pub(crate) next: Option<TaskId>,
}

/// Bytes reserved above a new task's initial `rsp`. Entry functions never
/// return, so the slot is never read.
const RETURN_SLOT: u64 = 8;

impl Task {
    /// Prepare a task that starts at `entry` on a fresh one-frame stack.
    ///
    /// The stack sits at the top of the new frame as seen through `mapper`,
    /// minus one slot standing in for the return address a `call` would
    /// have pushed, so `entry` starts with `rsp % 16 == 8` as the SysV ABI
    /// expects. The task runs in ring 0 with interrupts enabled, under the
    /// address space that is active right now.
    ///
    /// # Errors
    /// [`TaskError::OutOfMemory`] if `frames` has nothing left.
    pub fn create<A, M, U>(
        entry: TaskEntry,
        frames: &mut A,
        mapper: &M,
        mmu: &U,
    ) -> Result<Self, TaskError>
    where
        A: FrameAlloc,
        M: PhysMapper,
        U: Mmu,
    {
        let stack = frames.alloc_4k().ok_or(TaskError::OutOfMemory)?;
        let top = mapper.phys_to_virt(stack.base()).as_u64() + FRAME_SIZE;

        let context = TaskContext {
            rip: entry as usize as u64,
            cs: u64::from(KERNEL_CODE_SELECTOR),
            rflags: Rflags::for_new_task(),
            rsp: top - RETURN_SLOT,
            ss: u64::from(KERNEL_DATA_SELECTOR),
            ..TaskContext::zeroed()
        };
        let root = mmu.active_root();

        debug!(
            "created task at {:#x}, stack {stack:?} (top {top:#x}), root {root:?}",
            context.rip
        );
        Ok(Self {
            context,
            root,
            stack,
            next: None,
        })
    }

    #[inline]
    #[must_use]
    pub const fn context(&self) -> &TaskContext {
        &self.context
    }

    /// Root page table the task runs under.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> PhysicalPage<Size4K> {
        self.root
    }

    /// The frame backing the task's stack.
    #[inline]
    #[must_use]
    pub const fn stack(&self) -> PhysicalPage<Size4K> {
        self.stack
    }
}
