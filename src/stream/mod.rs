//! Hot, multicast, replay-latest output streams.
//!
//! A [`Broadcast`] keeps a single-slot cache of the latest value and a list
//! of attached listeners. Every publish reaches all listeners in the same
//! order; a listener attaching late first receives the cached value.
//!
//! A broadcast can be terminated with an error. Every attached listener
//! receives the error as its final item, and listeners attaching afterwards
//! receive only the error until the broadcast is reopened.

use futures::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type Listener<T, E> = mpsc::UnboundedSender<Result<T, E>>;

struct Inner<T, E> {
    seed: T,
    latest: T,
    terminal: Option<E>,
    listeners: Vec<(u64, Listener<T, E>)>,
    next_id: u64,
    observers: usize,
}

impl<T: Clone, E: Clone> Inner<T, E> {
    fn detach(&mut self, id: Option<u64>) {
        if let Some(id) = id {
            self.listeners.retain(|(listener, _)| *listener != id);
        }
        self.observers = self.observers.saturating_sub(1);
        if self.observers == 0 && self.terminal.is_none() {
            self.latest = self.seed.clone();
        }
    }
}

/// Multicast publisher with a replayed latest value.
///
/// Cloning yields another handle to the same broadcast.
///
/// # Example
///
/// ```rust
/// use futures::StreamExt;
/// use reactive_fsm::stream::Broadcast;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let counts: Broadcast<u32, String> = Broadcast::new(0);
/// counts.publish(1);
///
/// let mut late = counts.subscribe();
/// assert_eq!(late.next().await, Some(Ok(1)));
///
/// counts.publish(2);
/// assert_eq!(late.next().await, Some(Ok(2)));
/// # }
/// ```
pub struct Broadcast<T, E> {
    inner: Arc<Mutex<Inner<T, E>>>,
}

impl<T: Clone, E: Clone> Broadcast<T, E> {
    /// Create a broadcast seeded with `seed`, replayed until something else
    /// is published.
    pub fn new(seed: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                latest: seed.clone(),
                seed,
                terminal: None,
                listeners: Vec::new(),
                next_id: 0,
                observers: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push `value` to every attached listener and cache it.
    ///
    /// Returns `false` without publishing when the broadcast has terminated.
    pub fn publish(&self, value: T) -> bool {
        let mut inner = self.lock();
        if inner.terminal.is_some() {
            return false;
        }
        inner
            .listeners
            .retain(|(_, listener)| listener.send(Ok(value.clone())).is_ok());
        inner.latest = value;
        true
    }

    /// Terminate with `error`. Attached listeners receive it and end.
    /// A broadcast that already terminated keeps its first error.
    pub fn fail(&self, error: E) {
        let mut inner = self.lock();
        if inner.terminal.is_some() {
            return;
        }
        for (_, listener) in inner.listeners.drain(..) {
            let _ = listener.send(Err(error.clone()));
        }
        inner.terminal = Some(error);
    }

    /// Clear a terminal error and publish `value` as the latest.
    pub fn reopen(&self, value: T) {
        self.lock().terminal = None;
        self.publish(value);
    }

    /// Attach a listener. The first item is the cached value, or the
    /// terminal error.
    pub fn subscribe(&self) -> Subscription<T, E> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        inner.observers += 1;

        let id = match inner.terminal.clone() {
            Some(error) => {
                let _ = sender.send(Err(error));
                None
            }
            None => {
                let id = inner.next_id;
                inner.next_id += 1;
                let _ = sender.send(Ok(inner.latest.clone()));
                inner.listeners.push((id, sender));
                Some(id)
            }
        };

        Subscription {
            id,
            stream: UnboundedReceiverStream::new(receiver),
            inner: Arc::clone(&self.inner),
        }
    }

    /// Count as an observer without receiving values. Keeps the cached
    /// value alive while held.
    pub fn lease(&self) -> ObserverLease<T, E> {
        self.lock().observers += 1;
        ObserverLease {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn latest(&self) -> T {
        self.lock().latest.clone()
    }

    pub fn terminal_error(&self) -> Option<E> {
        self.lock().terminal.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().terminal.is_some()
    }

    /// Attached subscriptions plus held leases.
    pub fn observer_count(&self) -> usize {
        self.lock().observers
    }
}

impl<T, E> Clone for Broadcast<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A listener attached to a [`Broadcast`]. Detaches when dropped.
pub struct Subscription<T: Clone, E: Clone> {
    id: Option<u64>,
    stream: UnboundedReceiverStream<Result<T, E>>,
    inner: Arc<Mutex<Inner<T, E>>>,
}

impl<T: Clone, E: Clone> Stream for Subscription<T, E> {
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

impl<T: Clone, E: Clone> Drop for Subscription<T, E> {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .detach(self.id);
    }
}

/// Observer registration that receives nothing. See [`Broadcast::lease`].
pub struct ObserverLease<T: Clone, E: Clone> {
    inner: Arc<Mutex<Inner<T, E>>>,
}

impl<T: Clone, E: Clone> Drop for ObserverLease<T, E> {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .detach(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt};

    type Numbers = Broadcast<u32, String>;

    fn drain_ready(subscription: &mut Subscription<u32, String>) -> Vec<Result<u32, String>> {
        let mut items = Vec::new();
        while let Some(Some(item)) = subscription.next().now_or_never() {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn fresh_subscriber_sees_seed() {
        let numbers = Numbers::new(7);
        let mut subscription = numbers.subscribe();

        assert_eq!(drain_ready(&mut subscription), vec![Ok(7)]);
    }

    #[tokio::test]
    async fn late_subscriber_sees_latest_then_live_values() {
        let numbers = Numbers::new(0);
        numbers.publish(1);
        numbers.publish(2);

        let mut subscription = numbers.subscribe();
        numbers.publish(3);

        assert_eq!(drain_ready(&mut subscription), vec![Ok(2), Ok(3)]);
    }

    #[tokio::test]
    async fn all_subscribers_see_same_order() {
        let numbers = Numbers::new(0);
        let mut first = numbers.subscribe();
        let mut second = numbers.subscribe();

        for value in 1..=5 {
            numbers.publish(value);
        }

        let expected: Vec<Result<u32, String>> = (0..=5).map(Ok).collect();
        assert_eq!(drain_ready(&mut first), expected);
        assert_eq!(drain_ready(&mut second), expected);
    }

    #[tokio::test]
    async fn failure_ends_every_subscription() {
        let numbers = Numbers::new(0);
        let mut subscription = numbers.subscribe();

        numbers.fail("broken".to_string());
        assert!(!numbers.publish(9));

        assert_eq!(subscription.next().await, Some(Ok(0)));
        assert_eq!(subscription.next().await, Some(Err("broken".to_string())));
        assert_eq!(subscription.next().await, None);

        let mut late = numbers.subscribe();
        assert_eq!(late.next().await, Some(Err("broken".to_string())));
        assert_eq!(late.next().await, None);
    }

    #[tokio::test]
    async fn first_failure_wins() {
        let numbers = Numbers::new(0);
        numbers.fail("first".to_string());
        numbers.fail("second".to_string());

        assert_eq!(numbers.terminal_error(), Some("first".to_string()));
    }

    #[tokio::test]
    async fn reopen_clears_failure() {
        let numbers = Numbers::new(0);
        numbers.fail("broken".to_string());
        numbers.reopen(5);

        assert!(!numbers.is_terminated());
        let mut subscription = numbers.subscribe();
        assert_eq!(subscription.next().await, Some(Ok(5)));
    }

    #[test]
    fn observer_count_tracks_subscriptions_and_leases() {
        let numbers = Numbers::new(0);
        let subscription = numbers.subscribe();
        let lease = numbers.lease();
        assert_eq!(numbers.observer_count(), 2);

        drop(subscription);
        assert_eq!(numbers.observer_count(), 1);
        drop(lease);
        assert_eq!(numbers.observer_count(), 0);
    }

    #[test]
    fn last_detach_restores_seed() {
        let numbers = Numbers::new(0);
        let subscription = numbers.subscribe();
        numbers.publish(4);
        assert_eq!(numbers.latest(), 4);

        drop(subscription);
        assert_eq!(numbers.latest(), 0);
    }

    #[test]
    fn lease_keeps_latest_value() {
        let numbers = Numbers::new(0);
        let lease = numbers.lease();
        let subscription = numbers.subscribe();
        numbers.publish(4);

        drop(subscription);
        assert_eq!(numbers.latest(), 4);
        drop(lease);
        assert_eq!(numbers.latest(), 0);
    }
}
