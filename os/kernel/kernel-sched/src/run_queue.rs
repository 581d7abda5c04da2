//! Fixed arena of task slots threaded into a singly linked ring.

use crate::{SchedError, Task, TaskContext, TaskId};
use kernel_info::sched::MAX_TASKS;

pub(crate) struct RunQueue {
    slots: [Option<Task>; MAX_TASKS],
    head: Option<TaskId>,
    current: Option<TaskId>,
    len: usize,
}

impl RunQueue {
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; MAX_TASKS],
            head: None,
            current: None,
            len: 0,
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn current(&self) -> Option<TaskId> {
        self.current
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Append `task` at the tail. The first task also becomes current.
    pub fn push(&mut self, mut task: Task) -> Result<TaskId, SchedError> {
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            return Err(SchedError::RunQueueFull {
                capacity: MAX_TASKS,
            });
        };
        let id = TaskId(slot);
        task.next = None;
        self.slots[slot] = Some(task);
        self.len += 1;

        match self.tail() {
            Some(tail) => {
                if let Some(t) = self.slots[tail.0].as_mut() {
                    t.next = Some(id);
                }
            }
            None => {
                self.head = Some(id);
                self.current = Some(id);
            }
        }
        Ok(id)
    }

    /// Walk from the head to the last linked task.
    fn tail(&self) -> Option<TaskId> {
        let mut at = self.head?;
        while let Some(next) = self.get(at).and_then(|t| t.next) {
            at = next;
        }
        Some(at)
    }

    /// Save `saved` into the current task and move on to its successor,
    /// wrapping to the head after the last task.
    ///
    /// Returns the previous and the new current task; both are the same when
    /// only one task is queued.
    pub fn rotate(&mut self, saved: &TaskContext) -> Option<(TaskId, TaskId)> {
        let from = self.current?;
        let task = self.slots[from.0].as_mut()?;
        task.context = *saved;
        let to = task.next.or(self.head)?;
        self.current = Some(to);
        Some((from, to))
    }
}
