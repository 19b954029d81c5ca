//! Growable groups of error-first completions.
//!
//! A [`Group`] hands out [`Slot`]s, one per pending result, and runs its
//! continuations once every slot has been filled, or as soon as any slot
//! reports an error. Values are delivered in the order the slots were
//! reserved, not the order in which they complete.
//!
//! # Examples
//!
//! ```
//! use futures_group::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let queue = LocalQueue::new();
//! let seen = Rc::new(RefCell::new(None));
//!
//! let group: Group<&str, ()> = Group::chain(queue.clone(), |group| {
//!     let first = group.slot();
//!     let second = group.slot();
//!     second.ok("world");
//!     first.ok("hello");
//!     Ok(())
//! });
//!
//! let sink = seen.clone();
//! group.then(move |outcome| {
//!     *sink.borrow_mut() = Some(outcome.map(<[_]>::to_vec).map_err(|e| *e));
//! });
//!
//! // Slot completions are applied on the next turn of the queue.
//! assert!(seen.borrow().is_none());
//! queue.run_until_idle();
//! assert_eq!(*seen.borrow(), Some(Ok(vec!["hello", "world"])));
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::future::{Future, IntoFuture};

use crate::future::{Fill, Settled};
use crate::schedule::{LocalQueue, Schedule};

mod inner;
mod slot;

use inner::Inner;
pub use slot::Slot;

/// The terminal state of a group, as seen by its continuations.
///
/// `Ok` holds one value per slot in reservation order, `Err` holds the error
/// which rejected the group.
pub type Outcome<'a, T, E> = Result<&'a [T], &'a E>;

/// Where a group is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupStatus {
    /// Waiting on reserved slots.
    Pending,
    /// Every slot was filled with a value.
    Fulfilled,
    /// A slot reported an error, or the group was rejected manually.
    Rejected,
}

impl GroupStatus {
    /// Returns `true` if the status is [`Pending`][Self::Pending].
    #[must_use]
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// A growable set of pending results which resolves as a single unit.
///
/// A group resolves at most once: either into the fulfilled state, once the
/// last reserved slot has been filled, or into the rejected state, as soon as
/// any error is reported. Anything reported after that is ignored.
///
/// Continuations registered with [`then`] run in registration order when the
/// group resolves. A continuation registered after resolution runs right away
/// with the same terminal state every earlier continuation observed.
///
/// `Group` is a handle: clones share the same underlying state.
///
/// [`then`]: Group::then
pub struct Group<T, E, S = LocalQueue> {
    inner: Rc<RefCell<Inner<T, E>>>,
    scheduler: S,
}

impl<T, E, S: Clone> Clone for Group<T, E, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T, E, S> fmt::Debug for Group<T, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Group")
            .field("status", &inner.status())
            .field("pending", &inner.pending())
            .field("len", &inner.len())
            .finish()
    }
}

impl<T, E, S> Group<T, E, S> {
    /// Where the group is in its lifecycle.
    pub fn status(&self) -> GroupStatus {
        self.inner.borrow().status()
    }

    /// Returns `true` once the group has been fulfilled or rejected.
    pub fn is_resolved(&self) -> bool {
        !self.status().is_pending()
    }

    /// The number of slots reserved but not yet filled.
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending()
    }

    /// The number of slots reserved before the group resolved.
    ///
    /// For a fulfilled group this is the number of values its continuations
    /// receive.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` if no slots have been reserved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The scheduler slot completions are deferred to.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl<T, E, S> Group<T, E, S>
where
    T: 'static,
    E: 'static,
    S: Schedule,
{
    /// Create a new, empty group.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures_group::prelude::*;
    ///
    /// let group: Group<u8, ()> = Group::new(LocalQueue::new());
    /// assert_eq!(group.status(), GroupStatus::Pending);
    /// assert!(group.is_empty());
    /// ```
    pub fn new(scheduler: S) -> Self {
        Self::with_capacity(scheduler, 0)
    }

    /// Create a new, empty group with room for `capacity` slots.
    pub fn with_capacity(scheduler: S, capacity: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::with_capacity(capacity))),
            scheduler,
        }
    }

    /// Create a new group and run `body` against it.
    ///
    /// This is shorthand for [`Group::new`] followed by [`Group::fcall`].
    pub fn chain<F>(scheduler: S, body: F) -> Self
    where
        F: FnOnce(&Self) -> Result<(), E>,
    {
        let group = Self::new(scheduler);
        group.fcall(body);
        group
    }

    /// Run `body` with this group as its context.
    ///
    /// An `Err` returned by `body` rejects the group exactly like a slot
    /// reporting an error would, so `?` can be used freely while reserving
    /// slots.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures_group::prelude::*;
    ///
    /// let queue = LocalQueue::new();
    /// let group: Group<u16, String> = Group::new(queue.clone());
    /// group.fcall(|group| {
    ///     let port: u16 = "80a".parse().map_err(|_| "invalid port".to_string())?;
    ///     group.pass([port]);
    ///     Ok(())
    /// });
    ///
    /// assert_eq!(group.status(), GroupStatus::Rejected);
    /// ```
    pub fn fcall<F>(&self, body: F) -> &Self
    where
        F: FnOnce(&Self) -> Result<(), E>,
    {
        if let Err(err) = body(self) {
            self.error(err);
        }
        self
    }

    /// Reserve the next position in the group's values.
    ///
    /// The group cannot resolve successfully until the returned slot has been
    /// filled.
    ///
    /// Slots reserved after the group resolved are inert: they take no
    /// position, do not count towards [`len`], and filling them has no
    /// effect.
    ///
    /// [`len`]: Group::len
    pub fn slot(&self) -> Slot<T, E, S> {
        let index = self.inner.borrow_mut().reserve();
        Slot::new(self.clone(), index)
    }

    /// Reserve a slot and fill it from `future` once it completes.
    ///
    /// The returned [`Fill`] future must be polled for the slot to be
    /// filled.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures_group::prelude::*;
    /// use std::future;
    ///
    /// let queue = LocalQueue::new();
    /// let group: Group<u8, ()> = Group::new(queue.clone());
    /// let fill = group.slot_future(future::ready(Ok(7)));
    /// let settled = group.settled();
    ///
    /// let out = queue.run_until(async move {
    ///     fill.await;
    ///     settled.await
    /// });
    /// assert_eq!(out, Ok(vec![7]));
    /// ```
    pub fn slot_future<Fut>(&self, future: Fut) -> Fill<Fut, T, E, S>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        Fill::new(self.slot(), future)
    }

    /// Reserve one slot per value and fill each of them with that value.
    ///
    /// The values take their positions in call order, interleaved with any
    /// other slots. Like every slot, they are applied on the next turn of the
    /// scheduler.
    pub fn pass<I>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.slot().ok(value);
        }
        self
    }

    /// Reserve one slot and return a new group which fills it.
    ///
    /// When the child group is fulfilled its values are collected into a
    /// single value for the parent's slot. When it is rejected the parent
    /// slot reports the same error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures_group::prelude::*;
    ///
    /// let queue = LocalQueue::new();
    /// let parent: Group<Vec<char>, ()> = Group::new(queue.clone());
    /// parent.make_group().pass(['a', 'b']);
    /// parent.pass([vec!['c']]);
    ///
    /// let out = queue.run_until(parent.settled());
    /// assert_eq!(out, Ok(vec![vec!['a', 'b'], vec!['c']]));
    /// ```
    pub fn make_group<U>(&self) -> Group<U, E, S>
    where
        U: Clone + 'static,
        E: Clone,
        T: From<Vec<U>>,
    {
        let slot = self.slot();
        let child = Group::new(self.scheduler.clone());
        child.then(move |outcome| {
            slot.fill(outcome.map(|values| T::from(values.to_vec())).map_err(E::clone));
        });
        child
    }

    /// Register a continuation for the group's terminal state.
    ///
    /// If the group is still pending the continuation is queued behind every
    /// continuation registered before it. If the group already resolved it
    /// runs immediately.
    ///
    /// This includes a continuation registered by another continuation while
    /// the group is dispatching: it runs right away, ahead of the queued
    /// continuations which have not run yet.
    pub fn then<F>(&self, continuation: F) -> &Self
    where
        F: FnOnce(Outcome<'_, T, E>) + 'static,
    {
        let resolved = self.inner.borrow_mut().subscribe(Box::new(continuation));
        if let Some(dispatch) = resolved {
            dispatch.run();
        }
        self
    }

    /// Register a continuation which terminates a chain of groups.
    ///
    /// This behaves like [`then`], and is meant as the last link of a chain
    /// built with [`and_then`]: it observes either the final values or the
    /// first error raised anywhere along the chain, unchanged.
    ///
    /// [`then`]: Group::then
    /// [`and_then`]: Group::and_then
    pub fn anyway<F>(&self, continuation: F) -> &Self
    where
        F: FnOnce(Outcome<'_, T, E>) + 'static,
    {
        self.then(continuation)
    }

    /// Chain a new group onto this one.
    ///
    /// Once this group is fulfilled, `body` runs against a new group with this
    /// group's values, as if through [`fcall`]. If this group is rejected the
    /// new group is rejected with the same error and `body` never runs.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures_group::prelude::*;
    ///
    /// let queue = LocalQueue::new();
    /// let lengths = Group::<&str, ()>::chain(queue.clone(), |group| {
    ///     group.pass(["hello", "world!"]);
    ///     Ok(())
    /// })
    /// .and_then(|group, words| {
    ///     group.pass(words.iter().map(|word| word.len()));
    ///     Ok(())
    /// });
    ///
    /// assert_eq!(queue.run_until(lengths.settled()), Ok(vec![5, 6]));
    /// ```
    ///
    /// [`fcall`]: Group::fcall
    pub fn and_then<U, F>(&self, body: F) -> Group<U, E, S>
    where
        U: 'static,
        E: Clone,
        F: FnOnce(&Group<U, E, S>, &[T]) -> Result<(), E> + 'static,
    {
        let next = Group::new(self.scheduler.clone());
        let target = next.clone();
        self.then(move |outcome| match outcome {
            Ok(values) => {
                target.fcall(|group| body(group, values));
            }
            Err(err) => target.error(err.clone()),
        });
        next
    }

    /// Reject the group with `err`.
    ///
    /// Takes effect immediately. Does nothing if the group already resolved.
    pub fn error(&self, err: E) {
        let resolved = self.inner.borrow_mut().settle(Some(err));
        if let Some(dispatch) = resolved {
            dispatch.run();
        }
    }

    /// Resolve the group without further data.
    ///
    /// If no reserved slot is still waiting to be filled the group is
    /// fulfilled immediately with the values delivered so far. Otherwise this
    /// does nothing, and the group resolves when its last slot is filled.
    pub fn resolve(&self) {
        let resolved = {
            let mut inner = self.inner.borrow_mut();
            if inner.pending() == 0 {
                inner.settle(None)
            } else {
                tracing::trace!(pending = inner.pending(), "resolve deferred to last slot");
                None
            }
        };
        if let Some(dispatch) = resolved {
            dispatch.run();
        }
    }

    /// Wait for the group to resolve.
    ///
    /// The returned future registers a continuation right away, so it is
    /// ordered with respect to [`then`] like any other continuation.
    ///
    /// [`then`]: Group::then
    pub fn settled(&self) -> Settled<T, E>
    where
        T: Clone,
        E: Clone,
    {
        Settled::new(self)
    }

    /// Apply a slot completion. Runs on the scheduler.
    pub(crate) fn complete(&self, index: Option<usize>, result: Result<T, E>) {
        let resolved = {
            let mut inner = self.inner.borrow_mut();
            match (index, result) {
                (_, Err(err)) => inner.settle(Some(err)),
                (Some(index), Ok(value)) => inner.fill(index, value),
                (None, Ok(_)) => {
                    tracing::debug!("late slot filled, ignoring");
                    None
                }
            }
        };
        if let Some(dispatch) = resolved {
            dispatch.run();
        }
    }
}

impl<T, E, S> IntoFuture for Group<T, E, S>
where
    T: Clone + 'static,
    E: Clone + 'static,
    S: Schedule,
{
    type Output = Result<Vec<T>, E>;
    type IntoFuture = Settled<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.settled()
    }
}

#[cfg(test)]
mod test {
    use crate::prelude::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<Result<Vec<u8>, &'static str>>>>;

    fn record(group: &Group<u8, &'static str>, log: &Log) {
        let log = log.clone();
        group.then(move |outcome| {
            log.borrow_mut()
                .push(outcome.map(<[u8]>::to_vec).map_err(|err| *err));
        });
    }

    #[test]
    fn empty_group_resolves_on_demand() {
        let queue = LocalQueue::new();
        let log = Log::default();
        let group: Group<u8, &'static str> = Group::new(queue.clone());
        record(&group, &log);

        group.resolve();
        assert_eq!(*log.borrow(), [Ok(vec![])]);
        assert_eq!(group.status(), GroupStatus::Fulfilled);
        assert!(queue.is_empty());
    }

    #[test]
    fn resolve_waits_for_outstanding_slots() {
        let queue = LocalQueue::new();
        let log = Log::default();
        let group: Group<u8, &'static str> = Group::new(queue.clone());
        record(&group, &log);

        let slot = group.slot();
        group.resolve();
        assert!(log.borrow().is_empty());

        slot.ok(3);
        queue.run_until_idle();
        assert_eq!(*log.borrow(), [Ok(vec![3])]);
    }

    #[test]
    fn error_is_idempotent() {
        let queue = LocalQueue::new();
        let log = Log::default();
        let group: Group<u8, &'static str> = Group::new(queue.clone());
        record(&group, &log);

        group.error("first");
        group.error("second");
        group.resolve();
        assert_eq!(*log.borrow(), [Err("first")]);
    }

    #[test]
    fn fcall_error_rejects() {
        let queue = LocalQueue::new();
        let log = Log::default();
        let group: Group<u8, &'static str> = Group::new(queue.clone());
        group.fcall(|group| {
            group.pass([1]);
            Err("parse failed")
        });
        record(&group, &log);
        assert_eq!(*log.borrow(), [Err("parse failed")]);

        // The value passed before the failure arrives too late to matter.
        queue.run_until_idle();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn continuation_may_subscribe_again() {
        let queue = LocalQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let group: Group<u8, &'static str> = Group::new(queue.clone());

        let first = order.clone();
        let handle = group.clone();
        group.then(move |_| {
            first.borrow_mut().push("A");
            let nested = first.clone();
            handle.then(move |_| nested.borrow_mut().push("C"));
        });
        let second = order.clone();
        group.then(move |_| second.borrow_mut().push("B"));

        group.pass([9]);
        queue.run_until_idle();
        assert_eq!(*order.borrow(), ["A", "C", "B"]);
    }

    #[test]
    fn nested_failure_rejects_parent() {
        let queue = LocalQueue::new();
        let parent: Group<Vec<u8>, &str> = Group::new(queue.clone());
        let child = parent.make_group::<u8>();
        parent.pass([vec![1]]);
        child.slot().err("child failed");

        assert_eq!(queue.run_until(parent.settled()), Err("child failed"));
    }

    #[test]
    fn and_then_propagates_error() {
        let queue = LocalQueue::new();
        let ran = Rc::new(RefCell::new(false));

        let flag = ran.clone();
        let first: Group<u8, &str> = Group::new(queue.clone());
        let second: Group<u8, &str> = first.and_then(move |group, _| {
            *flag.borrow_mut() = true;
            group.resolve();
            Ok(())
        });
        first.error("stop");

        assert_eq!(queue.run_until(second.settled()), Err("stop"));
        assert!(!*ran.borrow());
    }

    #[test]
    fn debug_reports_progress() {
        let queue = LocalQueue::new();
        let group: Group<u8, ()> = Group::new(queue);
        let _slot = group.slot();
        let debug = alloc::format!("{group:?}");
        assert_eq!(debug, "Group { status: Pending, pending: 1, len: 1 }");
    }
}
