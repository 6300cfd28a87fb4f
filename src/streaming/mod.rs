//! Streaming primitives
//!
//! - [`ChatStream`]: the boxed event stream every client returns
//! - [`ReceiverStream`]: adapter exposing an mpsc receiver as a stream
//! - [`StreamMerger`]: fan-in of several event sources into one stream

pub mod merger;

pub use merger::{ChatStreamMerger, StreamMerger, merge_streams};

use crate::error::LlmError;
use futures::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use tokio::sync::mpsc;

pub use crate::types::streaming::*;

/// Chat stream type
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatStreamEvent, LlmError>> + Send>>;

/// A stream wrapper around `mpsc::Receiver` using a Mutex for interior mutability.
///
/// Clones share the same receiver, so every clone drains the same channel.
/// The channel only keeps the last poller's waker; the others park here and
/// are woken whenever a clone takes an item, sees the close, or is dropped.
pub struct ReceiverStream<T> {
    shared: Arc<Mutex<SharedReceiver<T>>>,
    id: usize,
}

struct SharedReceiver<T> {
    rx: mpsc::Receiver<T>,
    parked: Vec<(usize, Waker)>,
    next_id: usize,
}

impl<T> SharedReceiver<T> {
    fn park(&mut self, id: usize, waker: &Waker) {
        match self.parked.iter_mut().find(|(parked, _)| *parked == id) {
            Some((_, existing)) => existing.clone_from(waker),
            None => self.parked.push((id, waker.clone())),
        }
    }

    fn wake_others(&mut self, id: usize) {
        for (parked, waker) in std::mem::take(&mut self.parked) {
            if parked != id {
                waker.wake();
            }
        }
    }
}

impl<T> ReceiverStream<T> {
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SharedReceiver {
                rx,
                parked: Vec::new(),
                next_id: 1,
            })),
            id: 0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SharedReceiver<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for ReceiverStream<T> {
    fn clone(&self) -> Self {
        let id = {
            let mut shared = self.lock();
            let id = shared.next_id;
            shared.next_id += 1;
            id
        };
        Self {
            shared: Arc::clone(&self.shared),
            id,
        }
    }
}

impl<T> Drop for ReceiverStream<T> {
    fn drop(&mut self) {
        let id = self.id;
        let mut shared = self.lock();
        if shared.parked.iter().any(|(parked, _)| *parked == id) {
            // This handle may hold the channel's only waker.
            shared.wake_others(id);
        }
    }
}

impl<T> Stream for ReceiverStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let id = self.id;
        let mut shared = self.lock();
        match shared.rx.poll_recv(cx) {
            Poll::Pending => {
                shared.park(id, cx.waker());
                Poll::Pending
            }
            Poll::Ready(item) => {
                shared.wake_others(id);
                Poll::Ready(item)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn receiver_stream_ends_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = ReceiverStream::new(rx);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        drop(tx);
        assert_eq!(stream.next().await, Some(1));
        assert_eq!(stream.next().await, Some(2));
        assert_eq!(stream.next().await, None);
    }

    #[test]
    fn receiver_stream_wakes_on_send() {
        let (tx, rx) = mpsc::channel::<u8>(1);
        let mut stream = ReceiverStream::new(rx);
        let mut next = tokio_test::task::spawn(stream.next());

        tokio_test::assert_pending!(next.poll());
        tx.try_send(7).unwrap();
        assert!(next.is_woken());
        assert_eq!(tokio_test::assert_ready!(next.poll()), Some(7));
    }

    #[test]
    fn every_clone_is_woken_when_the_channel_closes() {
        let (tx, rx) = mpsc::channel::<u8>(1);
        let mut first = ReceiverStream::new(rx);
        let mut second = first.clone();
        let mut a = tokio_test::task::spawn(first.next());
        let mut b = tokio_test::task::spawn(second.next());

        tokio_test::assert_pending!(a.poll());
        tokio_test::assert_pending!(b.poll());
        drop(tx);

        assert!(b.is_woken());
        assert_eq!(tokio_test::assert_ready!(b.poll()), None);
        assert!(a.is_woken());
        assert_eq!(tokio_test::assert_ready!(a.poll()), None);
    }

    #[test]
    fn dropping_the_last_poller_hands_off_the_wakeup() {
        let (tx, rx) = mpsc::channel::<u8>(1);
        let mut first = ReceiverStream::new(rx);
        let mut second = first.clone();
        let mut a = tokio_test::task::spawn(first.next());

        tokio_test::assert_pending!(a.poll());
        {
            let mut b = tokio_test::task::spawn(second.next());
            tokio_test::assert_pending!(b.poll());
        }
        drop(second);

        assert!(a.is_woken());
        tokio_test::assert_pending!(a.poll());
        tx.try_send(3).unwrap();
        assert!(a.is_woken());
        assert_eq!(tokio_test::assert_ready!(a.poll()), Some(3));
    }
}
