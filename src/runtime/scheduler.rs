use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::thread::ThreadPtr;

pub type Task = Box<dyn FnOnce()>;

/// Splits a one-shot continuation into two handles, for suspension points
/// that hand the same failure continuation to more than one path. Whichever
/// handle fires first consumes the continuation; the other becomes a no-op,
/// preserving the exactly-once contract.
pub fn share_once(f: Box<dyn FnOnce()>) -> (Box<dyn FnOnce()>, Box<dyn FnOnce()>) {
    let shared = Rc::new(RefCell::new(Some(f)));
    let other = shared.clone();
    return (
        Box::new(move || {
            if let Some(f) = shared.borrow_mut().take() {
                f();
            }
        }),
        Box::new(move || {
            if let Some(f) = other.borrow_mut().take() {
                f();
            }
        }),
    );
}

/// Single-threaded cooperative executor. Suspending operations enqueue
/// their continuations here; `run_until_finished` drives the queue to
/// quiescence. There is exactly one logical thread running at a time, so a
/// FIFO queue is the whole scheduling policy.
pub struct Scheduler {
    queue: RefCell<VecDeque<Task>>,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        return Scheduler {
            queue: RefCell::new(VecDeque::new()),
        };
    }

    pub fn schedule(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }

    pub fn is_idle(&self) -> bool {
        return self.queue.borrow().is_empty();
    }

    /// Runs every queued task, including tasks scheduled while draining.
    pub fn drain(&self) {
        loop {
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Runs `work`, then drains the queue until the runtime is idle.
    /// Reports whether the scope completed without a pending Java exception
    /// on the driving thread.
    pub fn run_until_finished<W: FnOnce()>(&self, thread: ThreadPtr, work: W) -> bool {
        work();
        self.drain();
        return !thread.has_pending_exception();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn drains_in_fifo_order() {
        let scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            scheduler.schedule(Box::new(move || order.borrow_mut().push(i)));
        }
        scheduler.drain();
        assert_eq!(vec![0, 1, 2], *order.borrow());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn tasks_scheduled_while_draining_still_run() {
        let scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        {
            let order = order.clone();
            let scheduler_ptr = crate::object::ptr::Ptr::from_ref(&scheduler);
            scheduler.schedule(Box::new(move || {
                order.borrow_mut().push("outer");
                let order = order.clone();
                scheduler_ptr.schedule(Box::new(move || order.borrow_mut().push("inner")));
            }));
        }
        scheduler.drain();
        assert_eq!(vec!["outer", "inner"], *order.borrow());
    }
}
