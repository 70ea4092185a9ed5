//! Capture session control.
//!
//! Owns the single open/collect/close state machine that decides whether
//! a submitted batch is kept or dropped.

pub mod session;

pub use session::{CaptureSession, OpenWindow};
