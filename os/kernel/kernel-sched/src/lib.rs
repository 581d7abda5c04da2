//! # Preemptive Round-Robin Scheduling
//!
//! Kernel tasks are preempted by the timer interrupt and resumed in strict
//! registration order. There is no voluntary yield, no priority and no
//! termination: a registered task runs forever, one quantum at a time.
//!
//! ## Moving parts
//!
//! - [`TaskContext`]: the register snapshot, laid out exactly like the stack
//!   of the timer interrupt entry (general-purpose registers on top of the
//!   CPU's interrupt frame).
//! - [`Task`]: a context, a one-frame stack and the address space root to
//!   run under.
//! - [`Scheduler`]: the run queue plus the tick counter. [`Scheduler::tick`]
//!   decides, [`Dispatch::resume`] transfers control.
//!
//! ```text
//!  timer IRQ ─▶ entry stub (push GPRs) ─▶ Scheduler::preempt(&ctx)
//!                                             │ tick(): every `quantum` ticks
//!                                             ▼
//!                                   Dispatch { context, root }
//!                                             │ resume(): CR3, pop, iretq
//!                                             ▼
//!                                        next task
//! ```
//!
//! ## Example
//!
//! ```rust
//! use kernel_sched::{Scheduler, TaskContext};
//! use kernel_sync::InterruptControl;
//!
//! struct NoIrq;
//! impl InterruptControl for NoIrq {
//!     fn are_enabled() -> bool { false }
//!     fn disable() {}
//!     fn enable() {}
//! }
//!
//! let sched = Scheduler::<NoIrq>::new(20);
//! // Nothing registered: every tick is a no-op.
//! assert!(sched.tick(&TaskContext::default()).is_none());
//! assert_eq!(sched.ticks(), 1);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod context;
mod dispatch;
pub mod idle;
mod run_queue;
mod scheduler;
mod task;

pub use context::TaskContext;
pub use dispatch::Dispatch;
pub use scheduler::Scheduler;
pub use task::{Task, TaskEntry, TaskId};

/// Why a task could not be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum TaskError {
    /// No frame was available for the task's stack.
    #[error("out of physical memory for a task stack")]
    OutOfMemory,
}

/// Why the scheduler rejected a request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SchedError {
    /// Every run-queue slot is taken.
    #[error("run queue is full ({capacity} tasks)")]
    RunQueueFull { capacity: usize },
}
