//! The merged action feed.
//!
//! The caller's action source and the effect of the current occupancy are
//! each drained by a forwarding task into one unbounded queue. The
//! processing loop is the queue's only consumer, so actions are handled one
//! at a time and in arrival order, and each source keeps its own order.

use super::error::EffectError;
use super::machine::ActionStream;
use crate::core::panic_message;
use futures::{FutureExt, Stream, StreamExt};
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// One entry of the merged feed.
pub(crate) enum Feed<A> {
    /// Action from the caller's source.
    Source(A),
    /// Item from the effect started for `occupancy`.
    Effect {
        occupancy: u64,
        item: Result<A, EffectError>,
    },
}

/// Forward the caller's action source until it ends, the queue closes or
/// the run stops. A finished source does not end the run.
pub(crate) async fn forward_source<A, St>(
    source: St,
    feed: UnboundedSender<Feed<A>>,
    stop: CancellationToken,
) where
    St: Stream<Item = A> + Send + 'static,
{
    let mut source = Box::pin(source);
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            next = source.next() => match next {
                Some(action) => {
                    if feed.send(Feed::Source(action)).is_err() {
                        break;
                    }
                }
                None => {
                    tracing::debug!("action source finished");
                    break;
                }
            },
        }
    }
}

/// Forward one effect's actions, tagged with the occupancy that started it.
/// Stops, dropping the stream, when `cancel` fires or after the first error.
/// A panic while polling the stream is forwarded as an error.
pub(crate) async fn forward_effect<A>(
    mut actions: ActionStream<A>,
    occupancy: u64,
    feed: UnboundedSender<Feed<A>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(occupancy, "effect cancelled");
                break;
            }
            next = AssertUnwindSafe(actions.next()).catch_unwind() => match next {
                Ok(Some(item)) => {
                    let failed = item.is_err();
                    if feed.send(Feed::Effect { occupancy, item }).is_err() || failed {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!(occupancy, "effect completed");
                    break;
                }
                Err(payload) => {
                    let item = Err(EffectError::new(panic_message(payload)));
                    let _ = feed.send(Feed::Effect { occupancy, item });
                    break;
                }
            },
        }
    }
}
