use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use std::fmt;
use ulid::Ulid;
use utoipa::ToSchema;

/// The `(topic, event_id)` pair that identifies an event for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct IdentityKey {
    pub topic: String,
    pub event_id: String,
}

impl IdentityKey {
    pub fn new(topic: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            event_id: event_id.into(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.event_id)
    }
}

/// Event as submitted by a producer. Only `topic` and `source` are required.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EventInput {
    pub topic: String,
    pub source: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// `None` only when the field is absent; an explicit `null` is kept as raw `null`.
    #[serde(default, deserialize_with = "present_payload")]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Box<RawValue>>,
}

fn present_payload<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl EventInput {
    pub fn new(topic: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            source: source.into(),
            event_id: None,
            timestamp: None,
            payload: None,
        }
    }

    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Box<RawValue>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Opaque producer payload, kept as the exact JSON text it arrived as.
///
/// An absent payload serializes as an empty object.
#[derive(Debug, Clone, Default)]
pub struct Payload(Option<Box<RawValue>>);

impl Payload {
    pub fn get(&self) -> &str {
        self.0.as_deref().map_or("{}", RawValue::get)
    }
}

impl From<Option<Box<RawValue>>> for Payload {
    fn from(value: Option<Box<RawValue>>) -> Self {
        Self(value)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(raw) => raw.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// A normalized event: defaults applied, ready to be queued.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Event {
    pub topic: String,
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[schema(value_type = Object)]
    pub payload: Payload,
}

impl Event {
    /// Fills in a generated ULID `event_id` and the current time when absent.
    pub fn from_input(input: EventInput) -> Self {
        Self {
            topic: input.topic,
            event_id: input.event_id.unwrap_or_else(|| Ulid::new().to_string()),
            timestamp: input.timestamp.unwrap_or_else(Utc::now),
            source: input.source,
            payload: Payload::from(input.payload),
        }
    }

    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(self.topic.clone(), self.event_id.clone())
    }
}
