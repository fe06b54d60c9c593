use crate::error::{IntakeError, StoreError};
use crate::gateway::IntakeGateway;
use crate::state::SharedState;
use crate::stats::StatsSnapshot;
use crate::store::DedupStore;
use crate::worker::{DrainPolicy, Worker, WorkerHandle, WorkerState};
use agg_events::queue::{self, EnqueuePolicy, DEFAULT_CAPACITY};
use agg_events::types::{Event, EventInput};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub queue_capacity: usize,
    pub enqueue_policy: EnqueuePolicy,
    pub drain_policy: DrainPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_CAPACITY,
            enqueue_policy: EnqueuePolicy::default(),
            drain_policy: DrainPolicy::default(),
        }
    }
}

/// One running pipeline instance: gateway, queue, worker and their shared state.
///
/// Cheap to clone; every clone talks to the same worker.
#[derive(Clone)]
pub struct Aggregator {
    gateway: IntakeGateway,
    store: Arc<dyn DedupStore>,
    state: SharedState,
    worker_state: watch::Receiver<WorkerState>,
}

impl Aggregator {
    /// Spawns the worker on the current tokio runtime.
    pub fn start(store: Arc<dyn DedupStore>, config: PipelineConfig) -> (Self, WorkerHandle) {
        let (sender, receiver) = queue::bounded(config.queue_capacity, config.enqueue_policy);
        let state = SharedState::new();
        let handle = Worker::spawn(
            receiver,
            Arc::clone(&store),
            state.clone(),
            config.drain_policy,
        );
        let aggregator = Self {
            gateway: IntakeGateway::new(sender, state.clone()),
            store,
            state,
            worker_state: handle.subscribe(),
        };
        (aggregator, handle)
    }

    pub async fn publish(&self, inputs: Vec<EventInput>) -> Result<usize, IntakeError> {
        self.gateway.publish(inputs).await
    }

    /// Admitted events in processing order, optionally restricted to one topic.
    pub fn events(&self, topic: Option<&str>) -> Vec<Event> {
        self.state.events(topic)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.state.stats()
    }

    pub fn worker_state(&self) -> WorkerState {
        *self.worker_state.borrow()
    }

    pub fn queue_depth(&self) -> usize {
        self.gateway.queue_depth()
    }

    pub fn queue_capacity(&self) -> usize {
        self.gateway.queue_capacity()
    }

    pub async fn dedup_key_count(&self) -> Result<u64, StoreError> {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.len()).await {
            Ok(result) => result,
            Err(err) => Err(StoreError::unavailable(err.to_string())),
        }
    }
}
