use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_core::future::FusedFuture;
use futures_lite::ready;
use pin_project::pin_project;

use crate::group::Slot;
use crate::schedule::Schedule;

/// A future which fills a group's slot with the output of another future.
///
/// This `struct` is created by the [`slot_future`] method on
/// [`Group`][crate::Group]. See its documentation for more.
///
/// [`slot_future`]: crate::Group::slot_future
#[must_use = "futures do nothing unless you `.await` or poll them"]
#[pin_project]
pub struct Fill<Fut, T, E, S> {
    #[pin]
    future: Fut,
    /// Taken once the future completes.
    slot: Option<Slot<T, E, S>>,
}

impl<Fut, T, E, S> Fill<Fut, T, E, S> {
    pub(crate) fn new(slot: Slot<T, E, S>, future: Fut) -> Self {
        Self {
            future,
            slot: Some(slot),
        }
    }
}

impl<Fut, T, E, S> fmt::Debug for Fill<Fut, T, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fill").field("slot", &self.slot).finish()
    }
}

impl<Fut, T, E, S> Future for Fill<Fut, T, E, S>
where
    Fut: Future<Output = Result<T, E>>,
    T: 'static,
    E: 'static,
    S: Schedule,
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        assert!(
            this.slot.is_some(),
            "Futures must not be polled after completing"
        );

        let result = ready!(this.future.poll(cx));
        if let Some(slot) = this.slot.take() {
            slot.fill(result);
        }
        Poll::Ready(())
    }
}

impl<Fut, T, E, S> FusedFuture for Fill<Fut, T, E, S>
where
    Fut: Future<Output = Result<T, E>>,
    T: 'static,
    E: 'static,
    S: Schedule,
{
    fn is_terminated(&self) -> bool {
        self.slot.is_none()
    }
}

#[cfg(test)]
mod test {
    use crate::prelude::*;
    use alloc::vec;
    use futures::channel::oneshot;

    #[test]
    fn fills_in_reservation_order() {
        let queue = LocalQueue::new();
        let group: Group<u8, &str> = Group::new(queue.clone());

        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let a = group.slot_future(async move { rx_a.await.map_err(|_| "canceled") });
        let b = group.slot_future(async move { rx_b.await.map_err(|_| "canceled") });
        let settled = group.settled();

        tx_b.send(2).unwrap();
        tx_a.send(1).unwrap();
        let out = queue.run_until(async move {
            b.await;
            a.await;
            settled.await
        });
        assert_eq!(out, Ok(vec![1, 2]));
    }

    #[test]
    fn dropped_sender_rejects() {
        let queue = LocalQueue::new();
        let group: Group<u8, &str> = Group::new(queue.clone());

        let (tx, rx) = oneshot::channel::<u8>();
        let fill = group.slot_future(async move { rx.await.map_err(|_| "canceled") });
        group.slot().ok(1);
        drop(tx);

        queue.run_until(fill);
        queue.run_until_idle();
        assert_eq!(group.status(), GroupStatus::Rejected);
    }
}
