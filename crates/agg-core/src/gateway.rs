use crate::error::IntakeError;
use crate::state::SharedState;
use crate::validation::validate_batch;
use agg_events::queue::IntakeSender;
use agg_events::types::{Event, EventInput};
use tracing::debug;

/// Producer-facing side of the pipeline.
///
/// A batch is validated as a whole, then queue room is reserved for all of
/// it, then `received` and `topics` are recorded, and only then are events
/// handed to the worker. A rejected batch leaves no trace in the counters.
#[derive(Clone)]
pub struct IntakeGateway {
    sender: IntakeSender,
    state: SharedState,
}

impl IntakeGateway {
    pub fn new(sender: IntakeSender, state: SharedState) -> Self {
        Self { sender, state }
    }

    /// Returns the number of events accepted into the queue.
    pub async fn publish(&self, inputs: Vec<EventInput>) -> Result<usize, IntakeError> {
        if inputs.is_empty() {
            return Ok(0);
        }
        validate_batch(&inputs)?;
        let events: Vec<Event> = inputs.into_iter().map(Event::from_input).collect();

        let reservation = self.sender.reserve(events.len()).await?;
        self.state.record_received(&events);
        let count = events.len();
        reservation.send(events);
        debug!(count, "events queued");
        Ok(count)
    }

    pub fn queue_depth(&self) -> usize {
        self.sender.depth()
    }

    pub fn queue_capacity(&self) -> usize {
        self.sender.capacity()
    }
}
