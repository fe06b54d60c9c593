use agg_events::types::Event;

/// Admitted events in the order the worker resolved them. Never persisted.
#[derive(Debug, Default)]
pub struct RetainedIndex {
    events: Vec<Event>,
}

impl RetainedIndex {
    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn list(&self, topic: Option<&str>) -> Vec<Event> {
        match topic {
            Some(topic) => self
                .events
                .iter()
                .filter(|event| event.topic == topic)
                .cloned()
                .collect(),
            None => self.events.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agg_events::types::EventInput;

    fn event(topic: &str, id: &str) -> Event {
        Event::from_input(EventInput::new(topic, "test").with_event_id(id))
    }

    #[test]
    fn filters_by_topic_in_append_order() {
        let mut index = RetainedIndex::default();
        index.append(event("a", "1"));
        index.append(event("b", "2"));
        index.append(event("a", "3"));

        let ids: Vec<_> = index
            .list(Some("a"))
            .into_iter()
            .map(|e| e.event_id)
            .collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(index.list(None).len(), 3);
        assert!(index.list(Some("missing")).is_empty());
    }
}
