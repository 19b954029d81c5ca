//! Deferred execution for group bookkeeping.
//!
//! A [`Group`][crate::Group] never applies the effect of a slot completion
//! inside the call that completed the slot. Instead the effect is handed to a
//! [`Schedule`] implementation, which runs it on a later turn of its loop.
//! This keeps continuations from running while the code that filled the last
//! slot is still on the stack.
//!
//! [`LocalQueue`] is the single-threaded run loop shipped with this crate.
//!
//! # Examples
//!
//! ```
//! use futures_group::prelude::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let queue = LocalQueue::new();
//! let ran = Rc::new(Cell::new(false));
//!
//! let flag = ran.clone();
//! queue.defer(Box::new(move || flag.set(true)));
//! assert!(!ran.get());
//!
//! assert_eq!(queue.turn(), 1);
//! assert!(ran.get());
//! ```

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
#[cfg(feature = "std")]
use core::future::Future;
#[cfg(feature = "std")]
use core::task::Poll;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Defer work to a later turn of a cooperative run loop.
///
/// Implementations must never run `task` from inside `defer` itself.
pub trait Schedule: Clone + 'static {
    /// Queue `task` to run on a later turn.
    fn defer(&self, task: Task);
}

/// A single-threaded FIFO run loop.
///
/// Cloning a `LocalQueue` yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct LocalQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl fmt::Debug for LocalQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalQueue")
            .field("len", &self.len())
            .finish()
    }
}

impl LocalQueue {
    /// Create a new, empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of tasks waiting to run.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Returns `true` if no tasks are waiting to run.
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run a single turn of the loop.
    ///
    /// Only the tasks which were queued when the turn started are run; tasks
    /// deferred while the turn is in progress wait for the next turn. Returns
    /// the number of tasks which ran.
    pub fn turn(&self) -> usize {
        let queued = self.len();
        let mut ran = 0;
        while ran < queued {
            // The borrow must end before the task runs, tasks may defer more work.
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(tasks = ran, "finished turn");
        }
        ran
    }

    /// Run turns until no tasks are left.
    ///
    /// Returns the total number of tasks which ran.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            match self.turn() {
                0 => return total,
                ran => total += ran,
            }
        }
    }

    /// Block the current thread on `future`, running queued tasks whenever
    /// the future cannot make progress.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures_group::prelude::*;
    ///
    /// let queue = LocalQueue::new();
    /// let group: Group<u8, ()> = Group::new(queue.clone());
    /// group.pass([1, 2, 3]);
    ///
    /// assert_eq!(queue.run_until(group.settled()), Ok(vec![1, 2, 3]));
    /// ```
    #[cfg(feature = "std")]
    pub fn run_until<F: Future>(&self, future: F) -> F::Output {
        let mut future = core::pin::pin!(future);
        futures_lite::future::block_on(futures_lite::future::poll_fn(|cx| loop {
            if let Poll::Ready(output) = future.as_mut().poll(cx) {
                return Poll::Ready(output);
            }
            if self.turn() == 0 {
                return Poll::Pending;
            }
        }))
    }
}

impl Schedule for LocalQueue {
    fn defer(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn fifo_order() {
        let queue = LocalQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let log = log.clone();
            queue.defer(Box::new(move || log.borrow_mut().push(n)));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.borrow(), [0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn nested_defer_waits_for_next_turn() {
        let queue = LocalQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_log = log.clone();
        let inner_queue = queue.clone();
        queue.defer(Box::new(move || {
            inner_log.borrow_mut().push("outer");
            let log = inner_log.clone();
            inner_queue.defer(Box::new(move || log.borrow_mut().push("inner")));
        }));

        assert_eq!(queue.turn(), 1);
        assert_eq!(*log.borrow(), ["outer"]);
        assert_eq!(queue.turn(), 1);
        assert_eq!(*log.borrow(), ["outer", "inner"]);
        assert_eq!(queue.turn(), 0);
    }

    #[test]
    fn run_until_drains_between_polls() {
        let queue = LocalQueue::new();
        let (tx, rx) = futures::channel::oneshot::channel();
        queue.defer(Box::new(move || {
            let _ = tx.send(12);
        }));
        assert_eq!(queue.run_until(rx), Ok(12));
    }
}
