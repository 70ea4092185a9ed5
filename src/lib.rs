#![forbid(unsafe_code)]

//! Single-session capture window for browser instrumentation events.
//!
//! A [`collector::CaptureSession`] buffers submitted event batches while a
//! fixed-length window is open; [`http`] exposes it over loopback HTTP.

pub mod collector;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;

pub use collector::CaptureSession;
pub use config::CollectorConfig;
pub use errors::{AppError, Result};
