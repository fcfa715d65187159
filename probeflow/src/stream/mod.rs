//! Channel-backed streams feeding and draining the scheduler.
//!
//! A [`Streamable`] is an unbounded, single-pass sequence closed exactly
//! once, when its producer side is dropped. Clones share the same receiver,
//! so several consumers can drain one stream; each element is delivered to
//! exactly one of them.
//!
//! Producers are tokio tasks, so these functions must be called from within
//! a runtime.
//!
//! A producer task that panics hands its payload to the stream it feeds; the
//! consumer that finds the stream closed re-raises it instead of seeing a
//! short sequence.

use futures::stream::{self, Stream};
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{trace, warn};

type PanicPayload = Box<dyn Any + Send>;

/// Where a producer task leaves the payload of a panic for the consumer.
///
/// Only the first payload is kept.
#[derive(Clone, Default)]
pub(crate) struct PanicSlot {
    payload: Arc<parking_lot::Mutex<Option<PanicPayload>>>,
}

impl PanicSlot {
    pub(crate) fn set(&self, payload: PanicPayload) {
        let mut slot = self.payload.lock();
        if slot.is_none() {
            *slot = Some(payload);
        }
    }

    fn take(&self) -> Option<PanicPayload> {
        self.payload.lock().take()
    }
}

/// The producing half of a [`Streamable`].
pub type StreamSender<T> = mpsc::UnboundedSender<T>;

/// A single-pass sequence of values delivered asynchronously.
pub struct Streamable<T> {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
    panic: PanicSlot,
}

impl<T> Clone for Streamable<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: Arc::clone(&self.receiver),
            panic: self.panic.clone(),
        }
    }
}

impl<T: Send + 'static> Streamable<T> {
    /// Creates a stream and the sender that feeds it.
    ///
    /// The stream ends once every clone of the sender is dropped.
    #[must_use]
    pub fn channel() -> (StreamSender<T>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self::from_receiver(receiver))
    }

    /// Wraps an existing receiver.
    #[must_use]
    pub fn from_receiver(receiver: mpsc::UnboundedReceiver<T>) -> Self {
        Self {
            receiver: Arc::new(Mutex::new(receiver)),
            panic: PanicSlot::default(),
        }
    }

    /// Receives the next value, or `None` once the stream is closed and drained.
    ///
    /// # Panics
    ///
    /// Resumes the panic of a producer task that died before closing the
    /// stream. The first consumer to reach the end gets it.
    pub async fn recv(&self) -> Option<T> {
        let next = self.receiver.lock().await.recv().await;
        if next.is_none() {
            if let Some(payload) = self.panic.take() {
                panic::resume_unwind(payload);
            }
        }
        next
    }

    /// Handle a producer uses to report its panic. Must be set before the
    /// producer drops its sender.
    pub(crate) fn panic_slot(&self) -> PanicSlot {
        self.panic.clone()
    }

    /// Converts into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = T> + Send + 'static {
        stream::unfold(self, |source| async move {
            let next = source.recv().await?;
            Some((next, source))
        })
    }
}

impl<T> std::fmt::Debug for Streamable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streamable").finish_non_exhaustive()
    }
}

/// Spawns a producer that pushes every value, in order, then closes.
pub fn stream<I>(values: I) -> Streamable<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let (sender, output) = Streamable::channel();
    let values = values.into_iter();
    tokio::spawn(async move {
        for value in values {
            if sender.send(value).is_err() {
                break;
            }
        }
        trace!("stream producer closed");
    });
    output
}

/// Drains a stream into a list, in arrival order.
pub async fn collect<T: Send + 'static>(source: Streamable<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Some(value) = source.recv().await {
        out.push(value);
    }
    out
}

/// Merges several streams into one.
///
/// Every source is drained concurrently into the merged stream, which closes
/// once all sources are exhausted. Interleaving across sources is
/// unspecified; no element is dropped or duplicated.
pub fn zip<T, I>(sources: I) -> Streamable<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Streamable<T>>,
{
    let (sender, output) = Streamable::channel();
    for source in sources {
        let sender = sender.clone();
        let slot = output.panic_slot();
        tokio::spawn(async move {
            loop {
                match AssertUnwindSafe(source.recv()).catch_unwind().await {
                    Ok(Some(value)) => {
                        if sender.send(value).is_err() {
                            return;
                        }
                    }
                    Ok(None) => return,
                    Err(payload) => {
                        warn!("zip source panicked");
                        slot.set(payload);
                        return;
                    }
                }
            }
        });
    }
    output
}

/// Merges several streams and collects the result.
pub async fn zip_and_collect<T, I>(sources: I) -> Vec<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = Streamable<T>>,
{
    collect(zip(sources)).await
}
