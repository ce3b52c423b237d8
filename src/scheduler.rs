use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::ops::ControlFlow;

/// Identifies a task registered with a [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// A task runs once per dispatch until it returns [`ControlFlow::Break`] or gets cancelled.
pub type Task = Box<dyn FnMut() -> ControlFlow<()>>;

/// Runs bounded units of work "soon", without blocking the caller.
pub trait Scheduler {
    fn schedule(&self, task: Task) -> TaskId;

    /// Deregisters the task synchronously, it will not run again. Returns false if the task was
    /// not registered (anymore).
    fn cancel(&self, id: TaskId) -> bool;
}

/// A single threaded, cooperative idle queue.
///
/// Tasks are dispatched round robin, one at a time. The host calls [`dispatch`](Self::dispatch)
/// whenever it is idle, or [`run_until_idle`](Self::run_until_idle) to drain the queue.
#[derive(Default)]
pub struct IdleQueue {
    tasks: RefCell<VecDeque<(TaskId, Task)>>,
    next_id: Cell<u64>,
    running: Cell<Option<TaskId>>,
    running_cancelled: Cell<bool>,
}

impl fmt::Debug for IdleQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleQueue")
            .field("pending", &self.pending())
            .field("running", &self.running.get())
            .finish()
    }
}

impl IdleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered tasks, not counting one that is currently running.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Runs the next task once. Returns false if there was nothing to run.
    pub fn dispatch(&self) -> bool {
        let Some((id, mut task)) = self.tasks.borrow_mut().pop_front() else {
            return false;
        };

        self.running.set(Some(id));
        self.running_cancelled.set(false);

        let flow = {
            // A panicking task is dropped, it must not stay marked as running.
            let _running = ClearRunning(&self.running);
            task()
        };

        if flow.is_continue() && !self.running_cancelled.get() {
            self.tasks.borrow_mut().push_back((id, task));
        }

        true
    }

    /// Dispatches until no task is left, returning the number of dispatches.
    pub fn run_until_idle(&self) -> usize {
        let mut dispatches = 0;
        while self.dispatch() {
            dispatches += 1;
        }
        dispatches
    }
}

struct ClearRunning<'a>(&'a Cell<Option<TaskId>>);

impl Drop for ClearRunning<'_> {
    fn drop(&mut self) {
        self.0.set(None);
    }
}

impl Scheduler for IdleQueue {
    fn schedule(&self, task: Task) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.tasks.borrow_mut().push_back((id, task));

        id
    }

    fn cancel(&self, id: TaskId) -> bool {
        if self.running.get() == Some(id) {
            let already_cancelled = self.running_cancelled.replace(true);
            return !already_cancelled;
        }

        let mut tasks = self.tasks.borrow_mut();
        let len_before = tasks.len();
        tasks.retain(|(task_id, _)| *task_id != id);

        tasks.len() != len_before
    }
}
