use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

use futures_core::future::FusedFuture;

use crate::group::Group;
use crate::schedule::Schedule;

/// A future which waits for a group to resolve.
///
/// This `struct` is created by the [`settled`] method on [`Group`]. See its
/// documentation for more.
///
/// [`settled`]: crate::Group::settled
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Settled<T, E> {
    /// Whether the output has been handed out.
    consumed: bool,
    shared: Rc<RefCell<Shared<T, E>>>,
}

struct Shared<T, E> {
    output: Option<Result<Vec<T>, E>>,
    waker: Option<Waker>,
}

impl<T, E> Settled<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub(crate) fn new<S: Schedule>(group: &Group<T, E, S>) -> Self {
        let shared = Rc::new(RefCell::new(Shared {
            output: None,
            waker: None,
        }));
        let sink = shared.clone();
        group.then(move |outcome| {
            let waker = {
                let mut shared = sink.borrow_mut();
                shared.output = Some(outcome.map(<[T]>::to_vec).map_err(E::clone));
                shared.waker.take()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
        });
        Self {
            consumed: false,
            shared,
        }
    }
}

impl<T, E> fmt::Debug for Settled<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settled")
            .field("consumed", &self.consumed)
            .field("ready", &self.shared.borrow().output.is_some())
            .finish()
    }
}

impl<T, E> Future for Settled<T, E> {
    type Output = Result<Vec<T>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        assert!(!this.consumed, "Futures must not be polled after completing");

        let mut shared = this.shared.borrow_mut();
        match shared.output.take() {
            Some(output) => {
                this.consumed = true;
                Poll::Ready(output)
            }
            None => {
                match &mut shared.waker {
                    Some(waker) if waker.will_wake(cx.waker()) => {}
                    waker => *waker = Some(cx.waker().clone()),
                }
                Poll::Pending
            }
        }
    }
}

impl<T, E> FusedFuture for Settled<T, E> {
    fn is_terminated(&self) -> bool {
        self.consumed
    }
}
