//! Capture window lifecycle model.

/// Lifecycle state of the capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureState {
    /// No window is open; submissions are dropped.
    #[default]
    Idle,
    /// A window is open; submissions are buffered.
    Collecting,
}

impl CaptureState {
    /// Whether submissions are currently buffered.
    #[must_use]
    pub fn is_collecting(self) -> bool {
        matches!(self, Self::Collecting)
    }

    /// Determine whether a lifecycle transition is permitted.
    ///
    /// `Collecting -> Collecting` is allowed: a start while a window is
    /// open supersedes that window.
    #[must_use]
    pub fn can_transition_to(self, next: CaptureState) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Collecting, Self::Collecting) | (Self::Collecting, Self::Idle)
        )
    }
}

/// What happened to a submitted batch.
///
/// Only used for logging; clients always receive the same acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The batch was appended; carries the number of events.
    Buffered(usize),
    /// No window was open and the batch was discarded.
    Dropped,
}
