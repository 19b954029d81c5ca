use alloc::boxed::Box;
use core::fmt;

use super::Group;
use crate::schedule::Schedule;

/// A single-use handle to one reserved position of a [`Group`].
///
/// This `struct` is created by the [`slot`] method on [`Group`]. See its
/// documentation for more.
///
/// Completing a slot never touches the group directly: the effect is deferred
/// to the group's scheduler, whether the slot is completed from inside the
/// call that reserved it or many turns later.
///
/// Dropping a slot without completing it leaves the group waiting forever.
///
/// [`slot`]: Group::slot
#[must_use = "a group cannot resolve until all of its slots are filled"]
pub struct Slot<T, E, S> {
    group: Group<T, E, S>,
    /// `None` if the slot was reserved after the group resolved.
    index: Option<usize>,
}

impl<T, E, S> fmt::Debug for Slot<T, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").field("index", &self.index).finish()
    }
}

impl<T, E, S> Slot<T, E, S>
where
    T: 'static,
    E: 'static,
    S: Schedule,
{
    pub(crate) fn new(group: Group<T, E, S>, index: Option<usize>) -> Self {
        Self { group, index }
    }

    /// The position of this slot in the group's values.
    ///
    /// Returns `None` if the slot was reserved after the group resolved, in
    /// which case filling it has no effect.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Complete the slot with an error-first result.
    ///
    /// An `Err` rejects the group, an `Ok` writes the value at this slot's
    /// position. Either way the group observes the completion on the next
    /// turn of its scheduler.
    pub fn fill(self, result: Result<T, E>) {
        let Self { group, index } = self;
        let scheduler = group.scheduler.clone();
        scheduler.defer(Box::new(move || group.complete(index, result)));
    }

    /// Complete the slot with a value.
    pub fn ok(self, value: T) {
        self.fill(Ok(value));
    }

    /// Complete the slot with an error.
    pub fn err(self, err: E) {
        self.fill(Err(err));
    }

    /// Convert the slot into a callback, for APIs which take an `FnMut`.
    ///
    /// # Panics
    ///
    /// The returned callback panics if it is called more than once.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures_group::prelude::*;
    ///
    /// fn read_config(mut callback: impl FnMut(Result<&'static str, ()>)) {
    ///     callback(Ok("port = 8080"));
    /// }
    ///
    /// let queue = LocalQueue::new();
    /// let group: Group<&str, ()> = Group::new(queue.clone());
    /// read_config(group.slot().into_callback());
    ///
    /// assert_eq!(queue.run_until(group.settled()), Ok(vec!["port = 8080"]));
    /// ```
    pub fn into_callback(self) -> impl FnMut(Result<T, E>) + 'static {
        let mut slot = Some(self);
        move |result| match slot.take() {
            Some(slot) => slot.fill(result),
            None => panic!("slot callback invoked more than once"),
        }
    }
}
