//! Request handlers for the three collector routes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::models::batch::Batch;
use crate::models::capture::Submission;
use crate::models::Event;
use crate::{AppError, Result};

/// Query string accepted by `POST /collect`.
#[derive(Debug, Deserialize)]
pub struct CollectParams {
    /// Name of the submitting instrument. Required.
    pub instrument: Option<String>,
}

/// `GET /ping`: `200` when idle, `501` while a window is collecting.
pub async fn ping(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.collector.is_active() {
        StatusCode::NOT_IMPLEMENTED
    } else {
        StatusCode::OK
    }
}

/// `GET /`: run one capture window and return its events.
///
/// The window runs on its own task so a client hanging up mid-window
/// cannot leave the collector stuck collecting.
///
/// # Errors
///
/// Returns `AppError::Http` if the capture task panicked.
pub async fn start_capture(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Event>>> {
    let collector = Arc::clone(&state.collector);
    let events = tokio::spawn(async move { collector.start_session().await })
        .await
        .map_err(|err| AppError::Http(format!("capture task failed: {err}")))?;
    Ok(Json(events))
}

/// `POST /collect?instrument=<name>`: submit one batch.
///
/// Always acknowledges with an empty `200` once the body parses, whether
/// or not a window was open to keep it.
///
/// # Errors
///
/// Returns `AppError::InvalidRequest` when `instrument` is missing or the
/// body is not a JSON array.
pub async fn collect(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CollectParams>,
    body: Bytes,
) -> Result<StatusCode> {
    let instrument = params
        .instrument
        .ok_or_else(|| AppError::InvalidRequest("missing instrument query parameter".into()))?;
    let batch = Batch::from_json(instrument, &body)?;
    let instrument = batch.instrument.clone();

    match state.collector.submit(batch) {
        Submission::Buffered(count) => {
            info!(%instrument, count, bytes = body.len(), "batch collected");
        }
        Submission::Dropped => {
            info!(%instrument, bytes = body.len(), "batch ignored; no capture window open");
        }
    }

    Ok(StatusCode::OK)
}
