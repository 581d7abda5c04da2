use kernel_sched::{SchedError, TaskError};
use kernel_vmem::MapError;

/// Anything that can stop the kernel from coming up.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("address space setup failed: {0}")]
    Map(#[from] MapError),

    #[error("task creation failed: {0}")]
    Task(#[from] TaskError),

    #[error("scheduler rejected a task: {0}")]
    Sched(#[from] SchedError),
}
