//! Capture session controller: the window state machine and its buffer.
//!
//! A [`CaptureSession`] is `Idle` until [`start_session`](CaptureSession::start_session)
//! opens a window. While the window is open every submitted batch is
//! appended to the buffer in lock-acquisition order; batches submitted
//! while idle are dropped without error. When the fixed window duration
//! has elapsed the session returns to `Idle` and hands back the buffer.
//!
//! The lifecycle state and the buffer live behind one [`Mutex`] so they can
//! never be observed out of step. The lock is only held for short
//! synchronous critical sections and never across the window wait.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::models::batch::Batch;
use crate::models::capture::{CaptureState, Submission};
use crate::models::Event;

/// Flag, buffer, and window generation guarded as one value.
#[derive(Debug, Default)]
struct SessionState {
    phase: CaptureState,
    buffer: Vec<Event>,
    /// Bumped on every window open; lets a superseded window detect that
    /// a newer one owns the buffer.
    generation: u64,
}

impl SessionState {
    fn transition(&mut self, next: CaptureState) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid capture transition {:?} -> {next:?}",
            self.phase
        );
        debug!(from = ?self.phase, to = ?next, generation = self.generation, "capture state transition");
        self.phase = next;
    }
}

/// Single-session event collector.
///
/// Share it behind an `Arc`; every operation takes `&self`.
#[derive(Debug)]
pub struct CaptureSession {
    window: Duration,
    state: Mutex<SessionState>,
}

impl CaptureSession {
    /// Create an idle session whose windows last `window`.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Fixed length of every capture window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run one complete capture window.
    ///
    /// Clears the buffer and starts collecting, waits the fixed window
    /// duration without holding the lock, then stops collecting and
    /// returns the buffered events in arrival order.
    ///
    /// Calling this while a window is already open supersedes that window:
    /// its partial buffer is discarded and its caller receives an empty
    /// list. There is no way to shorten or cancel a running window.
    pub async fn start_session(&self) -> Vec<Event> {
        let window = self.open_window();
        let span = info_span!("capture_window", generation = window.generation);
        async move {
            tokio::time::sleep(self.window).await;
            window.close()
        }
        .instrument(span)
        .await
    }

    /// Open a window without scheduling its close.
    ///
    /// This is the first half of [`start_session`](Self::start_session):
    /// one critical section that clears the buffer and starts collecting.
    /// The window stays open until [`OpenWindow::close`] is called.
    #[must_use = "the window stays open until `close` is called"]
    pub fn open_window(&self) -> OpenWindow<'_> {
        let mut state = self.lock();
        let superseded = state.phase.is_collecting();
        state.generation = state.generation.wrapping_add(1);
        state.buffer.clear();
        state.transition(CaptureState::Collecting);
        let generation = state.generation;
        drop(state);

        if superseded {
            warn!(
                generation,
                "capture window opened while another was collecting; prior events discarded"
            );
        }
        info!(generation, window_ms = self.window_millis(), "capture window opened");

        OpenWindow {
            session: self,
            generation,
            opened_at: Instant::now(),
        }
    }

    /// Append a batch if a window is open, otherwise drop it.
    ///
    /// Events keep their order within the batch. Concurrent submissions
    /// are serialized on the session lock, so batches never interleave.
    pub fn submit(&self, batch: Batch) -> Submission {
        let Batch { instrument, events } = batch;
        let count = events.len();

        let mut state = self.lock();
        if !state.phase.is_collecting() {
            drop(state);
            debug!(%instrument, count, "no capture window open; batch dropped");
            return Submission::Dropped;
        }
        state.buffer.extend(events);
        let buffered = state.buffer.len();
        drop(state);

        debug!(%instrument, count, buffered, "batch buffered");
        Submission::Buffered(count)
    }

    /// Whether a window is currently open.
    ///
    /// Advisory only: a window may open or close right after this returns.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state().is_collecting()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CaptureState {
        self.lock().phase
    }

    fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }

    /// Every critical section leaves the state consistent, so a poisoned
    /// lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to an open capture window.
///
/// Returned by [`CaptureSession::open_window`]. Dropping it without
/// calling [`close`](Self::close) leaves the session collecting.
#[derive(Debug)]
pub struct OpenWindow<'a> {
    session: &'a CaptureSession,
    generation: u64,
    opened_at: Instant,
}

impl OpenWindow<'_> {
    /// Generation number assigned to this window.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop collecting and take the buffered events.
    ///
    /// If a newer window was opened in the meantime this window has been
    /// superseded: the newer window keeps collecting and this call
    /// returns an empty list.
    #[must_use]
    pub fn close(self) -> Vec<Event> {
        let mut state = self.session.lock();
        if state.generation != self.generation {
            let current = state.generation;
            drop(state);
            warn!(
                generation = self.generation,
                current, "capture window superseded before close; returning no events"
            );
            return Vec::new();
        }
        state.transition(CaptureState::Idle);
        let events = std::mem::take(&mut state.buffer);
        drop(state);

        let elapsed_ms = u64::try_from(self.opened_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            generation = self.generation,
            events = events.len(),
            elapsed_ms,
            "capture window closed"
        );
        events
    }
}
