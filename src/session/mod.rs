//! Interview capture session
//!
//! This module provides the `InterviewSession` state machine that manages:
//! - Acquisition and release of the camera+microphone source
//! - Track muting without releasing the source
//! - The per-second elapsed-time counter while recording
//! - Packaging the artifact and submitting it for evaluation

mod config;
mod session;
mod snapshot;
mod state;
mod timer;

pub use config::{SessionConfig, SessionIdGenerator};
pub use session::InterviewSession;
pub use snapshot::SessionSnapshot;
pub use state::{CaptureState, SessionError, SessionOutcome};
