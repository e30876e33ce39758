use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::CaptureState;

/// Point-in-time view of a session for the UI layer
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,

    pub question_id: String,

    /// Current capture state (serialized with a `status` tag)
    pub state: CaptureState,

    /// Seconds recorded so far; frozen outside `Recording`
    pub elapsed_seconds: u64,

    /// `elapsed_seconds` as mm:ss
    pub elapsed_display: String,

    /// Header badge in the session language ("REC" while recording)
    pub badge: &'static str,

    pub video_enabled: bool,

    pub audio_enabled: bool,

    /// Whether a live media source is held
    pub media_bound: bool,

    /// Tracks of the bound source that are not stopped
    pub active_tracks: usize,

    /// Size of the captured artifact still held by the session
    pub artifact_bytes: Option<usize>,

    /// Whether the elapsed-time counter is scheduled
    pub timer_active: bool,

    pub created_at: DateTime<Utc>,
}
