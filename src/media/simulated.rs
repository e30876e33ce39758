// In-process camera+microphone device
//
// Grants a source with one video and one audio track after a configurable
// latency. The device is exclusive: while one source is live, further
// requests fail with `DeviceUnavailable`. Failures can also be scripted for
// the next N requests, and for the next N source releases. All granted sources report into a shared ledger so
// callers can verify that nothing stays bound after release.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::device::{Artifact, MediaConstraints, MediaDevice, MediaError, MediaSource, TrackKind};

/// Payload produced by a simulated recording
pub const SIMULATED_PAYLOAD: &[u8] = b"mock audio";
pub const SIMULATED_MIME_TYPE: &str = "audio/webm";

#[derive(Debug, Clone, Copy)]
struct Track {
    kind: TrackKind,
    enabled: bool,
}

#[derive(Debug, Default)]
struct Ledger {
    /// source id -> live tracks
    live: HashMap<String, Vec<Track>>,
    granted: usize,
    /// Errors reported by upcoming `stop` calls
    release_failures: VecDeque<String>,
}

/// Simulated media device
#[derive(Clone)]
pub struct SimulatedDevice {
    latency: Duration,
    failures: Arc<Mutex<VecDeque<MediaError>>>,
    ledger: Arc<Mutex<Ledger>>,
}

impl SimulatedDevice {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failures: Arc::new(Mutex::new(VecDeque::new())),
            ledger: Arc::new(Mutex::new(Ledger::default())),
        }
    }

    /// Device that grants immediately
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Make the next request fail with `error` (queued after earlier scripted failures)
    pub fn fail_next(&self, error: MediaError) {
        self.failures.lock().push_back(error);
    }

    /// Make the next source release report a track error
    ///
    /// The tracks are still stopped; only the reported result changes.
    pub fn fail_next_release(&self, reason: impl Into<String>) {
        self.ledger.lock().release_failures.push_back(reason.into());
    }

    /// Sources granted and not yet stopped
    pub fn bound_sources(&self) -> usize {
        self.ledger.lock().live.len()
    }

    /// Tracks across all bound sources, muted or not
    pub fn active_tracks(&self) -> usize {
        self.ledger.lock().live.values().map(Vec::len).sum()
    }

    /// Live tracks of `kind` currently enabled
    pub fn enabled_tracks(&self, kind: TrackKind) -> usize {
        self.ledger
            .lock()
            .live
            .values()
            .flatten()
            .filter(|t| t.kind == kind && t.enabled)
            .count()
    }

    /// Total number of successful acquisitions
    pub fn granted_count(&self) -> usize {
        self.ledger.lock().granted
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::instant()
    }
}

#[async_trait::async_trait]
impl MediaDevice for SimulatedDevice {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaSource>, MediaError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(error) = self.failures.lock().pop_front() {
            info!("Simulated device refusing request: {}", error);
            return Err(error);
        }

        let mut tracks = Vec::new();
        if constraints.video {
            tracks.push(Track {
                kind: TrackKind::Video,
                enabled: true,
            });
        }
        if constraints.audio {
            tracks.push(Track {
                kind: TrackKind::Audio,
                enabled: true,
            });
        }

        let id = {
            let mut ledger = self.ledger.lock();
            if let Some(holder) = ledger.live.keys().next() {
                return Err(MediaError::DeviceUnavailable(format!(
                    "device in use by {}",
                    holder
                )));
            }
            ledger.granted += 1;
            let id = format!("sim-source-{}", ledger.granted);
            ledger.live.insert(id.clone(), tracks);
            id
        };

        info!("Simulated device granted {}", id);

        Ok(Box::new(SimulatedSource {
            id,
            ledger: Arc::clone(&self.ledger),
            capturing: false,
            stopped: false,
        }))
    }

    fn name(&self) -> &str {
        "simulated camera+microphone"
    }
}

/// Source handed out by `SimulatedDevice`
struct SimulatedSource {
    id: String,
    ledger: Arc<Mutex<Ledger>>,
    capturing: bool,
    stopped: bool,
}

impl MediaSource for SimulatedSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_enabled(&mut self, kind: TrackKind, enabled: bool) -> usize {
        let mut ledger = self.ledger.lock();
        let Some(tracks) = ledger.live.get_mut(&self.id) else {
            return 0;
        };

        let mut touched = 0;
        for track in tracks.iter_mut().filter(|t| t.kind == kind) {
            track.enabled = enabled;
            touched += 1;
        }
        touched
    }

    fn active_tracks(&self) -> usize {
        self.ledger
            .lock()
            .live
            .get(&self.id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn begin_capture(&mut self) {
        self.capturing = !self.stopped;
    }

    fn end_capture(&mut self, duration_secs: u64) -> Artifact {
        if !std::mem::take(&mut self.capturing) {
            return Artifact::empty(duration_secs);
        }

        Artifact {
            mime_type: SIMULATED_MIME_TYPE.to_string(),
            payload: Bytes::from_static(SIMULATED_PAYLOAD),
            duration_secs,
        }
    }

    fn stop(&mut self) -> Result<(), MediaError> {
        if self.stopped {
            return Ok(());
        }

        self.stopped = true;
        self.capturing = false;
        let failure = {
            let mut ledger = self.ledger.lock();
            ledger.live.remove(&self.id);
            ledger.release_failures.pop_front()
        };
        debug!("Simulated source {} stopped", self.id);

        match failure {
            Some(reason) => Err(MediaError::Track(reason)),
            None => Ok(()),
        }
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        // A dropped handle must not keep the device bound
        let _ = self.stop();
    }
}
