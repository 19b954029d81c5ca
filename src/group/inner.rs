use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use smallvec::{smallvec, SmallVec};

use super::{GroupStatus, Outcome};
use crate::utils::SlotTable;

/// A continuation waiting on the terminal state of a group.
pub(crate) type Continuation<T, E> = Box<dyn FnOnce(Outcome<'_, T, E>)>;

type Continuations<T, E> = SmallVec<[Continuation<T, E>; 2]>;

/// The shared state behind every handle to a group.
pub(crate) struct Inner<T, E> {
    slots: SlotTable<T>,
    /// Set exactly once, when the group resolves.
    outcome: Option<Rc<Result<Vec<T>, E>>>,
    continuations: Continuations<T, E>,
}

impl<T, E> Inner<T, E> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotTable::with_capacity(capacity),
            outcome: None,
            continuations: SmallVec::new(),
        }
    }

    pub(crate) fn status(&self) -> GroupStatus {
        match self.outcome.as_deref() {
            None => GroupStatus::Pending,
            Some(Ok(_)) => GroupStatus::Fulfilled,
            Some(Err(_)) => GroupStatus::Rejected,
        }
    }

    /// The number of slots reserved but not yet filled.
    pub(crate) fn pending(&self) -> usize {
        self.slots.outstanding()
    }

    /// The number of slots reserved before resolution.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reserve a position. Returns `None` once the group has resolved.
    pub(crate) fn reserve(&mut self) -> Option<usize> {
        if self.outcome.is_some() {
            tracing::debug!("slot reserved after resolution, it will be ignored");
            return None;
        }
        let index = self.slots.reserve();
        tracing::trace!(slot = index, "slot reserved");
        Some(index)
    }

    /// Write a value into a reserved position, resolving the group if it was
    /// the last one outstanding.
    pub(crate) fn fill(&mut self, index: usize, value: T) -> Option<Dispatch<T, E>> {
        if self.outcome.is_some() {
            tracing::debug!(slot = index, "slot filled after resolution, ignoring");
            return None;
        }
        tracing::trace!(slot = index, "slot filled");
        if self.slots.fill(index, value) {
            self.settle(None)
        } else {
            None
        }
    }

    /// Move into the terminal state.
    ///
    /// `failure` decides between the error and the success state. Returns the
    /// continuations to run, or `None` if the group had already resolved.
    pub(crate) fn settle(&mut self, failure: Option<E>) -> Option<Dispatch<T, E>> {
        if self.outcome.is_some() {
            tracing::debug!("group already resolved, ignoring");
            return None;
        }
        let outcome = match failure {
            Some(err) => {
                self.slots.clear();
                Err(err)
            }
            None => Ok(self.slots.take()),
        };
        let outcome = Rc::new(outcome);
        self.outcome = Some(outcome.clone());
        tracing::trace!(
            rejected = outcome.is_err(),
            continuations = self.continuations.len(),
            "group resolved"
        );
        Some(Dispatch {
            outcome,
            continuations: core::mem::take(&mut self.continuations),
        })
    }

    /// Register a continuation.
    ///
    /// If the group already resolved the continuation is handed back so the
    /// caller can run it once the state is no longer borrowed.
    pub(crate) fn subscribe(&mut self, continuation: Continuation<T, E>) -> Option<Dispatch<T, E>> {
        match &self.outcome {
            Some(outcome) => Some(Dispatch {
                outcome: outcome.clone(),
                continuations: smallvec![continuation],
            }),
            None => {
                self.continuations.push(continuation);
                None
            }
        }
    }
}

/// Continuations released by a state transition, run after the shared
/// state has been unlocked.
pub(crate) struct Dispatch<T, E> {
    outcome: Rc<Result<Vec<T>, E>>,
    continuations: Continuations<T, E>,
}

impl<T, E> Dispatch<T, E> {
    pub(crate) fn run(self) {
        let Self {
            outcome,
            continuations,
        } = self;
        for continuation in continuations {
            continuation(view(&outcome));
        }
    }
}

fn view<T, E>(outcome: &Result<Vec<T>, E>) -> Outcome<'_, T, E> {
    match outcome {
        Ok(values) => Ok(values.as_slice()),
        Err(err) => Err(err),
    }
}
