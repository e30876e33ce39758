use bytes::Bytes;
use serde::Serialize;

/// Kind of track carried by a live media source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Camera
    Video,
    /// Microphone
    Audio,
}

/// Which track kinds to request from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    /// User declined or the OS blocked access
    #[error("permission to use camera/microphone was denied")]
    PermissionDenied,

    /// No device, or the device is held elsewhere
    #[error("media device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Failure while operating on an already granted track
    #[error("media track error: {0}")]
    Track(String),
}

/// Recorded payload handed to the submission service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// MIME type of the payload (e.g. "audio/webm")
    pub mime_type: String,
    /// Recorded bytes
    pub payload: Bytes,
    /// Length of the capture in seconds
    pub duration_secs: u64,
}

impl Artifact {
    /// Artifact of a preview-less session (nothing was captured)
    pub fn empty(duration_secs: u64) -> Self {
        Self {
            mime_type: "application/octet-stream".to_string(),
            payload: Bytes::new(),
            duration_secs,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Camera+microphone capture device
///
/// Implementations:
/// - `SimulatedDevice`: in-process device with scripted failures (demo + tests)
/// - A browser/OS bridge can implement the same trait without touching the session
#[async_trait::async_trait]
pub trait MediaDevice: Send + Sync {
    /// Request exclusive access to a live source
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaSource>, MediaError>;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Exclusively owned live capture handle
///
/// Muting (`set_enabled`) and releasing (`stop`) are distinct: a muted track
/// is still live and still counts towards `active_tracks`.
pub trait MediaSource: Send + Sync {
    /// Source identifier for logging
    fn id(&self) -> &str;

    /// Enable or disable every track of `kind`; returns the number of tracks touched
    fn set_enabled(&mut self, kind: TrackKind, enabled: bool) -> usize;

    /// Number of tracks not yet stopped
    fn active_tracks(&self) -> usize;

    /// Begin capturing into the recording buffer
    fn begin_capture(&mut self);

    /// Finish capturing and hand over what was recorded
    fn end_capture(&mut self, duration_secs: u64) -> Artifact;

    /// Stop all tracks; calling it again is a no-op
    fn stop(&mut self) -> Result<(), MediaError>;
}
