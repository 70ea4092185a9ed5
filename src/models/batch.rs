//! Submitted event batches.

use crate::models::Event;
use crate::{AppError, Result};

/// One submission: an instrument tag plus its ordered events.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Name of the submitting source. Used for logging only.
    pub instrument: String,
    /// Events in the order the client sent them.
    pub events: Vec<Event>,
}

impl Batch {
    /// Construct a batch from already-decoded events.
    #[must_use]
    pub fn new(instrument: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            instrument: instrument.into(),
            events,
        }
    }

    /// Decode a raw request body as a JSON array of events.
    ///
    /// The body's content type is not consulted; instrumented pages post
    /// `text/plain` to stay clear of CORS preflight.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidRequest` when the instrument tag is empty,
    /// the body is not valid JSON, or the JSON is not an array.
    pub fn from_json(instrument: impl Into<String>, body: &[u8]) -> Result<Self> {
        let instrument = instrument.into();
        if instrument.is_empty() {
            return Err(AppError::InvalidRequest(
                "instrument must not be empty".into(),
            ));
        }

        let value: Event = serde_json::from_slice(body)
            .map_err(|err| AppError::InvalidRequest(format!("body is not valid json: {err}")))?;
        match value {
            Event::Array(events) => Ok(Self { instrument, events }),
            other => Err(AppError::InvalidRequest(format!(
                "body must be a json array, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Number of events carried by the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch carries no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn json_kind(value: &Event) -> &'static str {
    match value {
        Event::Null => "null",
        Event::Bool(_) => "boolean",
        Event::Number(_) => "number",
        Event::String(_) => "string",
        Event::Array(_) => "array",
        Event::Object(_) => "object",
    }
}
