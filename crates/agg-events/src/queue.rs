//! Bounded FIFO between the intake gateway and the single worker.
//!
//! Producers reserve room for a whole batch before sending anything, so a
//! batch is either queued completely and contiguously or not at all.

use crate::types::Event;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

pub const DEFAULT_CAPACITY: usize = 10_000;
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(2000);

/// What a producer does when the queue has no room for its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueuePolicy {
    /// Suspend until room frees up, failing with [`EnqueueError::Full`] after `timeout`.
    Wait { timeout: Duration },
    /// Fail with [`EnqueueError::Full`] immediately.
    Reject,
}

impl Default for EnqueuePolicy {
    fn default() -> Self {
        Self::Wait {
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("intake queue is full")]
    Full,
    #[error("batch of {size} events exceeds queue capacity {capacity}")]
    BatchTooLarge { size: usize, capacity: usize },
    #[error("intake queue is closed")]
    Closed,
}

pub fn bounded(capacity: usize, policy: EnqueuePolicy) -> (IntakeSender, IntakeReceiver) {
    let capacity = capacity.max(1);
    let (sender, receiver) = mpsc::channel(capacity);
    (
        IntakeSender {
            inner: sender,
            capacity,
            policy,
        },
        IntakeReceiver { inner: receiver },
    )
}

#[derive(Clone)]
pub struct IntakeSender {
    inner: mpsc::Sender<Event>,
    capacity: usize,
    policy: EnqueuePolicy,
}

impl IntakeSender {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events queued or reserved but not yet taken by the consumer.
    pub fn depth(&self) -> usize {
        self.inner.max_capacity() - self.inner.capacity()
    }

    /// Reserves `count` slots according to the configured policy.
    pub async fn reserve(&self, count: usize) -> Result<Reservation<'_>, EnqueueError> {
        if count > self.capacity {
            return Err(EnqueueError::BatchTooLarge {
                size: count,
                capacity: self.capacity,
            });
        }
        let permits = match self.policy {
            EnqueuePolicy::Reject => self.inner.try_reserve_many(count).map_err(|err| match err {
                mpsc::error::TrySendError::Full(()) => EnqueueError::Full,
                mpsc::error::TrySendError::Closed(()) => EnqueueError::Closed,
            })?,
            EnqueuePolicy::Wait { timeout } => {
                tokio::time::timeout(timeout, self.inner.reserve_many(count))
                    .await
                    .map_err(|_| EnqueueError::Full)?
                    .map_err(|_| EnqueueError::Closed)?
            }
        };
        Ok(Reservation { permits })
    }
}

/// Queue slots held for one batch. Unused slots are released on drop.
pub struct Reservation<'a> {
    permits: mpsc::PermitIterator<'a, Event>,
}

impl Reservation<'_> {
    /// Sends events in order into the reserved slots. Cannot fail.
    pub fn send(self, events: impl IntoIterator<Item = Event>) {
        for (permit, event) in self.permits.zip(events) {
            permit.send(event);
        }
    }
}

pub struct IntakeReceiver {
    inner: mpsc::Receiver<Event>,
}

impl IntakeReceiver {
    /// Waits for the next event. `None` once the queue is closed and empty.
    pub async fn recv(&mut self) -> Option<Event> {
        self.inner.recv().await
    }

    /// Stops accepting new events; already queued events stay readable.
    pub fn close(&mut self) {
        self.inner.close();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
