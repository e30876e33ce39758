use serde::Serialize;

/// Capture state of an interview session
///
/// ```text
/// Idle -> AcquiringMedia -> Ready | PermissionDenied
/// PermissionDenied -> AcquiringMedia            (retry)
/// Idle | Ready | PermissionDenied -> Recording -> Processing -> Completed | Failed
/// Failed -> Processing                          (explicit retry)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaptureState {
    Idle,
    AcquiringMedia,
    PermissionDenied { reason: String },
    Ready,
    Recording,
    Processing,
    Completed,
    Failed { reason: String },
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::AcquiringMedia => "acquiring_media",
            CaptureState::PermissionDenied { .. } => "permission_denied",
            CaptureState::Ready => "ready",
            CaptureState::Recording => "recording",
            CaptureState::Processing => "processing",
            CaptureState::Completed => "completed",
            CaptureState::Failed { .. } => "failed",
        }
    }

    /// No recording has happened yet
    pub fn is_pre_recording(&self) -> bool {
        matches!(
            self,
            CaptureState::Idle | CaptureState::Ready | CaptureState::PermissionDenied { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Completed | CaptureState::Failed { .. })
    }
}

/// Final result of a submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("a media request is already outstanding")]
    AcquisitionPending,

    #[error("no media source is bound")]
    NoMediaSource,

    #[error("already recording")]
    AlreadyRecording,

    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("no captured artifact to submit")]
    NothingToSubmit,

    #[error("session has been shut down")]
    ShutDown,
}
