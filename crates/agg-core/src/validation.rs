use crate::error::IntakeError;
use agg_events::types::EventInput;

pub fn validate_event(index: usize, input: &EventInput) -> Result<(), IntakeError> {
    if input.topic.trim().is_empty() {
        return Err(invalid(index, "topic must not be empty"));
    }
    if input.source.trim().is_empty() {
        return Err(invalid(index, "source must not be empty"));
    }
    if let Some(event_id) = &input.event_id {
        if event_id.trim().is_empty() {
            return Err(invalid(index, "event_id must not be empty when provided"));
        }
    }
    Ok(())
}

pub fn validate_batch(inputs: &[EventInput]) -> Result<(), IntakeError> {
    inputs
        .iter()
        .enumerate()
        .try_for_each(|(index, input)| validate_event(index, input))
}

fn invalid(index: usize, message: &str) -> IntakeError {
    IntakeError::Invalid {
        index,
        message: message.to_string(),
    }
}
