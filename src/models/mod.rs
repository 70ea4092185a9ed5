//! Domain model module declarations.

pub mod batch;
pub mod capture;

/// One instrumentation event. Opaque to the collector.
pub type Event = serde_json::Value;
