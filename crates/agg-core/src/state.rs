//! Index and counters behind a single lock.
//!
//! The worker is the only writer of `admitted`, `duplicates` and the index;
//! the gateway writes `received` and `topics`. Readers get a cloned snapshot,
//! so an admitted count is never observed without its index entry.

use crate::index::RetainedIndex;
use crate::stats::{Stats, StatsSnapshot};
use agg_events::types::Event;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct AggregateState {
    index: RetainedIndex,
    stats: Stats,
}

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<AggregateState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, AggregateState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AggregateState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_received<'a>(&self, events: impl IntoIterator<Item = &'a Event>) {
        let mut state = self.write();
        for event in events {
            state.stats.received += 1;
            if !state.stats.topics.contains(&event.topic) {
                state.stats.topics.insert(event.topic.clone());
            }
        }
    }

    pub fn record_admitted(&self, event: Event) {
        let mut state = self.write();
        state.index.append(event);
        state.stats.admitted += 1;
    }

    pub fn record_duplicate(&self) {
        self.write().stats.duplicates += 1;
    }

    pub fn record_store_failure(&self) {
        self.write().stats.store_failures += 1;
    }

    pub fn events(&self, topic: Option<&str>) -> Vec<Event> {
        self.read().index.list(topic)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.read().stats.snapshot()
    }

    pub fn retained(&self) -> usize {
        self.read().index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agg_events::types::EventInput;

    #[test]
    fn received_counts_every_event_and_dedups_topics() {
        let state = SharedState::new();
        let events: Vec<Event> = ["a", "b", "a"]
            .iter()
            .map(|topic| Event::from_input(EventInput::new(*topic, "s")))
            .collect();
        state.record_received(&events);

        let stats = state.stats();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.topics, ["a", "b"]);
        assert!(!stats.is_settled());
    }

    #[test]
    fn admitted_count_tracks_index() {
        let state = SharedState::new();
        let event = Event::from_input(EventInput::new("a", "s").with_event_id("1"));
        state.record_received([&event]);
        state.record_admitted(event);
        state.record_duplicate();

        let stats = state.stats();
        assert_eq!(stats.admitted, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(state.retained(), 1);
        assert_eq!(state.events(Some("a")).len(), 1);
    }
}
