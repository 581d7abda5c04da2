use crate::run_queue::RunQueue;
use crate::{Dispatch, SchedError, Task, TaskContext, TaskId};
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU64, Ordering};
use kernel_sync::{InterruptControl, SpinMutex};
use log::{debug, trace};

/// Tick-driven round-robin scheduler.
///
/// Every `quantum`-th call to [`tick`](Self::tick) saves the interrupted
/// context into the current task and selects its successor in registration
/// order. Queue state is only touched with interrupts disabled through `I`.
pub struct Scheduler<I> {
    queue: SpinMutex<RunQueue>,
    ticks: AtomicU64,
    quantum: u64,
    _irq: PhantomData<fn() -> I>,
}

impl<I: InterruptControl> Scheduler<I> {
    /// A scheduler with an empty run queue. A `quantum` of zero is treated
    /// as one.
    #[must_use]
    pub const fn new(quantum: u64) -> Self {
        Self {
            queue: SpinMutex::new(RunQueue::new()),
            ticks: AtomicU64::new(0),
            quantum: if quantum == 0 { 1 } else { quantum },
            _irq: PhantomData,
        }
    }

    /// Append `task` to the run queue.
    ///
    /// The first task registered becomes the current one; it is assumed to
    /// be what the CPU is executing when the first switch happens.
    ///
    /// # Errors
    /// [`SchedError::RunQueueFull`] if every slot is taken.
    pub fn register_task(&self, task: Task) -> Result<TaskId, SchedError> {
        let rip = task.context.rip;
        let id = self.queue.lock_irq_with::<I>().push(task)?;
        debug!("registered {id} (rip {rip:#x})");
        Ok(id)
    }

    /// Account one timer tick.
    ///
    /// On a quantum boundary the current task's state is replaced by `saved`
    /// and the next task is returned for dispatch. Returns `None` when there
    /// is nothing to do: off-boundary ticks, an empty queue, or a single task
    /// that simply keeps running.
    pub fn tick(&self, saved: &TaskContext) -> Option<Dispatch> {
        let now = self.ticks.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        let mut queue = self.queue.lock_irq_with::<I>();
        if queue.is_empty() || !now.is_multiple_of(self.quantum) {
            return None;
        }

        let (from, to) = queue.rotate(saved)?;
        if from == to {
            return None;
        }

        let next = queue.get(to)?;
        debug!("tick {now}: switch {from} -> {to}");
        let c = &next.context;
        trace!(
            "{to}: rip={:#x} rsp={:#x} rbp={:#x} rbx={:#x} rsi={:#x} rdi={:#x}",
            c.rip, c.rsp, c.rbp, c.rbx, c.rsi, c.rdi
        );
        Some(Dispatch {
            context: next.context,
            root: next.root,
        })
    }

    /// [`tick`](Self::tick), then switch to the selected task if any.
    ///
    /// Returns normally only when no switch is due.
    ///
    /// # Safety
    /// Must be called from the timer interrupt path with interrupts disabled;
    /// `saved` must be the interrupted code's full register state, and the
    /// caller's stack frame is abandoned on a switch.
    #[cfg(target_arch = "x86_64")]
    pub unsafe fn preempt(&self, saved: &TaskContext) {
        if let Some(dispatch) = self.tick(saved) {
            unsafe { dispatch.resume() }
        }
    }

    /// The task that owns the CPU, if any was registered.
    pub fn current(&self) -> Option<TaskId> {
        self.queue.lock_irq_with::<I>().current()
    }

    pub fn task_count(&self) -> usize {
        self.queue.lock_irq_with::<I>().len()
    }

    /// Timer ticks seen so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub const fn quantum(&self) -> u64 {
        self.quantum
    }

    /// The last saved (or initial) context of task `id`.
    pub fn snapshot(&self, id: TaskId) -> Option<TaskContext> {
        self.queue.lock_irq_with::<I>().get(id).map(|t| t.context)
    }
}
