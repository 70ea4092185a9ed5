//! HTTP transport for the collector.
//!
//! Maps `GET /ping`, `GET /` and `POST /collect` onto the capture
//! session and adds permissive CORS headers so instrumented pages on
//! any origin can reach it.

use std::sync::Arc;

use crate::collector::CaptureSession;
use crate::config::CollectorConfig;

pub mod handlers;
pub mod server;

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    /// Effective configuration.
    pub config: Arc<CollectorConfig>,
    /// The one capture session owned by this server.
    pub collector: Arc<CaptureSession>,
}

impl AppState {
    /// Build state with a fresh idle session sized from `config`.
    #[must_use]
    pub fn new(config: CollectorConfig) -> Self {
        let collector = Arc::new(CaptureSession::new(config.window()));
        Self {
            config: Arc::new(config),
            collector,
        }
    }
}
