//! Single sequential consumer of the intake queue.
//!
//! The worker resolves every event it dequeues as admitted, duplicate or
//! store failure. On shutdown it always finishes the event in hand; what
//! happens to the rest of the backlog is decided by [`DrainPolicy`].

use crate::error::{AggregatorError, StoreError};
use crate::state::SharedState;
use crate::store::DedupStore;
use agg_events::queue::IntakeReceiver;
use agg_events::types::Event;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Draining,
    Stopped,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Close the queue and resolve everything already queued.
    #[default]
    Backlog,
    /// Close the queue and leave queued events unresolved.
    CurrentItem,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub processed: u64,
    pub admitted: u64,
    pub duplicates: u64,
    pub store_failures: u64,
    /// Queued events left unresolved under [`DrainPolicy::CurrentItem`].
    pub abandoned: u64,
}

pub(crate) struct Worker {
    receiver: IntakeReceiver,
    store: Arc<dyn DedupStore>,
    state: SharedState,
    policy: DrainPolicy,
    status: watch::Sender<WorkerState>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    pub(crate) fn spawn(
        receiver: IntakeReceiver,
        store: Arc<dyn DedupStore>,
        state: SharedState,
        policy: DrainPolicy,
    ) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(WorkerState::Running);
        let worker = Self {
            receiver,
            store,
            state,
            policy,
            status: status_tx,
            shutdown: shutdown_rx,
        };
        let join = tokio::spawn(worker.run());
        WorkerHandle {
            shutdown: shutdown_tx,
            status: status_rx,
            join,
        }
    }

    async fn run(mut self) -> WorkerReport {
        info!(policy = ?self.policy, "event worker started");
        let mut report = WorkerReport::default();

        loop {
            let event = tokio::select! {
                biased;
                // A dropped handle counts as a shutdown request.
                _ = self.shutdown.changed() => break,
                next = self.receiver.recv() => match next {
                    Some(event) => event,
                    None => break,
                },
            };
            resolve(&self.store, &self.state, event, &mut report).await;
        }

        self.status.send_replace(WorkerState::Draining);
        self.receiver.close();
        info!(backlog = self.receiver.len(), policy = ?self.policy, "event worker draining");
        match self.policy {
            DrainPolicy::Backlog => {
                while let Some(event) = self.receiver.recv().await {
                    resolve(&self.store, &self.state, event, &mut report).await;
                }
            }
            DrainPolicy::CurrentItem => {
                // Waits out reservations taken before the close so late sends are counted too.
                while self.receiver.recv().await.is_some() {
                    report.abandoned += 1;
                }
                if report.abandoned > 0 {
                    warn!(abandoned = report.abandoned, "queued events left unresolved at shutdown");
                }
            }
        }

        self.status.send_replace(WorkerState::Stopped);
        info!(
            processed = report.processed,
            admitted = report.admitted,
            duplicates = report.duplicates,
            store_failures = report.store_failures,
            "event worker stopped"
        );
        report
    }
}

/// Settles one event as admitted, duplicate or store failure.
async fn resolve(
    store: &Arc<dyn DedupStore>,
    state: &SharedState,
    event: Event,
    report: &mut WorkerReport,
) {
    report.processed += 1;
    let key = event.key();
    let store = Arc::clone(store);
    let outcome = match tokio::task::spawn_blocking(move || store.admit_if_new(&key)).await {
        Ok(result) => result,
        Err(err) => Err(StoreError::unavailable(err.to_string())),
    };

    match outcome {
        Ok(true) => {
            info!(topic = %event.topic, event_id = %event.event_id, "processing new event");
            state.record_admitted(event);
            report.admitted += 1;
        }
        Ok(false) => {
            warn!(topic = %event.topic, event_id = %event.event_id, "duplicate event dropped");
            state.record_duplicate();
            report.duplicates += 1;
        }
        Err(err) => {
            error!(
                topic = %event.topic,
                event_id = %event.event_id,
                error = %err,
                "dedup store failed, event not resolved"
            );
            state.record_store_failure();
            report.store_failures += 1;
        }
    }
}

pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    status: watch::Receiver<WorkerState>,
    join: JoinHandle<WorkerReport>,
}

impl WorkerHandle {
    pub fn state(&self) -> WorkerState {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.status.clone()
    }

    /// Signals shutdown and waits for the worker to finish draining.
    pub async fn shutdown(self) -> Result<WorkerReport, AggregatorError> {
        self.shutdown.send_replace(true);
        self.join.await.map_err(|err| AggregatorError::Internal {
            message: format!("event worker panicked: {err}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDedupStore;
    use agg_events::queue::{self, EnqueuePolicy, IntakeSender};
    use agg_events::types::{EventInput, IdentityKey};
    use std::sync::{mpsc, Mutex};
    use tokio::sync::oneshot;

    struct FailingStore;

    impl DedupStore for FailingStore {
        fn admit_if_new(&self, _key: &IdentityKey) -> Result<bool, StoreError> {
            Err(StoreError::unavailable("disk on fire"))
        }

        fn len(&self) -> Result<u64, StoreError> {
            Err(StoreError::unavailable("disk on fire"))
        }
    }

    /// Parks the first admission until the test releases it.
    struct GatedStore {
        inner: MemoryDedupStore,
        entered: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl GatedStore {
        fn new() -> (Self, oneshot::Receiver<()>, mpsc::Sender<()>) {
            let (entered_tx, entered_rx) = oneshot::channel();
            let (release_tx, release_rx) = mpsc::channel();
            let store = Self {
                inner: MemoryDedupStore::new(),
                entered: Mutex::new(Some(entered_tx)),
                release: Mutex::new(release_rx),
            };
            (store, entered_rx, release_tx)
        }
    }

    impl DedupStore for GatedStore {
        fn admit_if_new(&self, key: &IdentityKey) -> Result<bool, StoreError> {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                entered.send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            self.inner.admit_if_new(key)
        }

        fn len(&self) -> Result<u64, StoreError> {
            self.inner.len()
        }
    }

    async fn enqueue(sender: &IntakeSender, state: &SharedState, ids: &[&str]) {
        let events: Vec<Event> = ids
            .iter()
            .map(|id| Event::from_input(EventInput::new("t", "s").with_event_id(*id)))
            .collect();
        let reservation = sender.reserve(events.len()).await.unwrap();
        state.record_received(&events);
        reservation.send(events);
    }

    #[tokio::test]
    async fn backlog_policy_resolves_everything_queued() {
        let (sender, receiver) = queue::bounded(16, EnqueuePolicy::Reject);
        let state = SharedState::new();
        enqueue(&sender, &state, &["1", "2", "1", "3", "2"]).await;

        let handle = Worker::spawn(
            receiver,
            Arc::new(MemoryDedupStore::new()),
            state.clone(),
            DrainPolicy::Backlog,
        );
        let report = handle.shutdown().await.unwrap();

        assert_eq!(report.processed, 5);
        assert_eq!(report.admitted, 3);
        assert_eq!(report.duplicates, 2);
        assert_eq!(report.abandoned, 0);
        let stats = state.stats();
        assert!(stats.is_settled());
        let ids: Vec<_> = state.events(None).into_iter().map(|e| e.event_id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn current_item_policy_abandons_backlog() {
        let (sender, receiver) = queue::bounded(16, EnqueuePolicy::Reject);
        let state = SharedState::new();
        enqueue(&sender, &state, &["1", "2", "3"]).await;

        let handle = Worker::spawn(
            receiver,
            Arc::new(MemoryDedupStore::new()),
            state.clone(),
            DrainPolicy::CurrentItem,
        );
        // Shutdown is signalled before the worker is first polled, so the
        // biased select observes it ahead of any queued event.
        let report = handle.shutdown().await.unwrap();

        assert_eq!(report.processed + report.abandoned, 3);
        assert_eq!(report.abandoned, 3);
        assert_eq!(state.stats().admitted, 0);
        assert!(sender.reserve(1).await.is_err());
    }

    #[tokio::test]
    async fn current_item_policy_finishes_event_in_hand() {
        let (sender, receiver) = queue::bounded(16, EnqueuePolicy::Reject);
        let state = SharedState::new();
        enqueue(&sender, &state, &["1", "2", "3"]).await;
        let (store, entered, release) = GatedStore::new();

        let handle = Worker::spawn(receiver, Arc::new(store), state.clone(), DrainPolicy::CurrentItem);
        entered.await.unwrap();
        let (report, ()) = tokio::join!(handle.shutdown(), async {
            tokio::task::yield_now().await;
            release.send(()).unwrap();
        });
        let report = report.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.admitted, 1);
        assert_eq!(report.abandoned, 2);
        let ids: Vec<_> = state.events(None).into_iter().map(|e| e.event_id).collect();
        assert_eq!(ids, ["1"]);
    }

    #[tokio::test]
    async fn current_item_policy_counts_sends_from_open_reservations() {
        let (sender, receiver) = queue::bounded(16, EnqueuePolicy::Reject);
        let state = SharedState::new();
        enqueue(&sender, &state, &["1", "2"]).await;
        let late = sender.reserve(1).await.unwrap();

        let handle = Worker::spawn(
            receiver,
            Arc::new(MemoryDedupStore::new()),
            state.clone(),
            DrainPolicy::CurrentItem,
        );
        let (report, ()) = tokio::join!(handle.shutdown(), async {
            tokio::task::yield_now().await;
            late.send([Event::from_input(EventInput::new("t", "s").with_event_id("3"))]);
        });
        let report = report.unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(report.abandoned, 3);
    }

    #[tokio::test]
    async fn store_failure_is_neither_admitted_nor_duplicate() {
        let (sender, receiver) = queue::bounded(16, EnqueuePolicy::Reject);
        let state = SharedState::new();
        enqueue(&sender, &state, &["1"]).await;

        let handle = Worker::spawn(receiver, Arc::new(FailingStore), state.clone(), DrainPolicy::Backlog);
        let report = handle.shutdown().await.unwrap();

        assert_eq!(report.store_failures, 1);
        let stats = state.stats();
        assert_eq!(stats.admitted, 0);
        assert_eq!(stats.duplicates, 0);
        assert_eq!(stats.store_failures, 1);
        assert!(stats.is_settled());
        assert!(state.events(None).is_empty());
    }

    #[tokio::test]
    async fn state_moves_to_stopped() {
        let (_sender, receiver) = queue::bounded(4, EnqueuePolicy::Reject);
        let handle = Worker::spawn(
            receiver,
            Arc::new(MemoryDedupStore::new()),
            SharedState::new(),
            DrainPolicy::Backlog,
        );
        let mut status = handle.subscribe();
        assert_eq!(handle.state(), WorkerState::Running);
        handle.shutdown().await.unwrap();
        status
            .wait_for(|state| *state == WorkerState::Stopped)
            .await
            .unwrap();
    }
}
