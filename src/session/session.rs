use super::config::SessionConfig;
use super::snapshot::SessionSnapshot;
use super::state::{CaptureState, SessionError, SessionOutcome};
use super::timer::ElapsedTimer;
use crate::api::SubmissionService;
use crate::language::format_elapsed;
use crate::media::{Artifact, MediaDevice, MediaSource, TrackKind};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Elapsed-time counter period
const TICK: Duration = Duration::from_secs(1);

/// Mutable session state, guarded by a single lock
///
/// The lock is never held across an await point.
struct Inner {
    session_id: String,
    state: CaptureState,
    elapsed_seconds: u64,
    video_enabled: bool,
    audio_enabled: bool,
    media: Option<Box<dyn MediaSource>>,
    artifact: Option<Artifact>,
    timer: Option<ElapsedTimer>,
    /// Bumped whenever a timer is started or halted; stale ticks compare unequal
    timer_epoch: u64,
    acquiring: bool,
    submitting: bool,
    shut_down: bool,
}

impl Inner {
    fn transition(&mut self, next: CaptureState) {
        info!(
            "Session {}: {} -> {}",
            self.session_id,
            self.state.name(),
            next.name()
        );
        self.state = next;
    }

    fn halt_timer(&mut self) {
        self.timer_epoch += 1;
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
            debug!(
                "Session {}: timer halted at {}s",
                self.session_id, self.elapsed_seconds
            );
        }
    }

    fn release_media(&mut self) {
        if let Some(mut source) = self.media.take() {
            release_source(&self.session_id, source.as_mut());
        }
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            operation,
            state: self.state.name(),
        }
    }
}

/// Stop every track of `source`; errors are logged and never block teardown
fn release_source(session_id: &str, source: &mut dyn MediaSource) {
    match source.stop() {
        Ok(()) => info!("Session {}: released media source {}", session_id, source.id()),
        Err(e) => warn!(
            "Session {}: failed to stop media source {}: {}",
            session_id,
            source.id(),
            e
        ),
    }
}

/// Timer callback; a tick for a destroyed session or a stale epoch is a no-op
fn tick(inner: &Weak<Mutex<Inner>>, epoch: u64) -> bool {
    let Some(inner) = inner.upgrade() else {
        return false;
    };
    let mut guard = inner.lock();

    if guard.timer_epoch != epoch || guard.state != CaptureState::Recording {
        return false;
    }

    guard.elapsed_seconds += 1;
    true
}

/// Async operation that has moved the session out of its resting state
#[derive(Debug, Clone, Copy)]
enum Pending {
    Acquire,
    Submit,
}

/// Rolls an interrupted operation back when its future is dropped mid-await
///
/// Disarmed once the awaited call returns; the normal path then settles the
/// state itself.
struct PendingGuard<'a> {
    inner: &'a Mutex<Inner>,
    pending: Pending,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(inner: &'a Mutex<Inner>, pending: Pending) -> Self {
        Self {
            inner,
            pending,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut inner = self.inner.lock();
        match self.pending {
            Pending::Acquire => {
                inner.acquiring = false;
                if inner.state == CaptureState::AcquiringMedia {
                    warn!("Session {}: media request cancelled", inner.session_id);
                    inner.transition(CaptureState::PermissionDenied {
                        reason: "media request cancelled".to_string(),
                    });
                }
            }
            Pending::Submit => {
                inner.submitting = false;
                if inner.state == CaptureState::Processing {
                    warn!("Session {}: submission cancelled", inner.session_id);
                    inner.transition(CaptureState::Failed {
                        reason: "submission cancelled".to_string(),
                    });
                }
            }
        }
    }
}

/// One practice attempt: media lifecycle, recording timer and submission
///
/// All operations take `&self`; the session is meant to have a single owner,
/// but independent async operations (acquisition, submission) may overlap and
/// are serialized on the internal state lock.
pub struct InterviewSession {
    config: SessionConfig,
    device: Arc<dyn MediaDevice>,
    submitter: Arc<dyn SubmissionService>,
    created_at: DateTime<Utc>,
    inner: Arc<Mutex<Inner>>,
}

impl InterviewSession {
    pub fn new(
        config: SessionConfig,
        device: Arc<dyn MediaDevice>,
        submitter: Arc<dyn SubmissionService>,
    ) -> Self {
        info!(
            "Creating interview session {} for question {}",
            config.session_id, config.question_id
        );

        let inner = Inner {
            session_id: config.session_id.clone(),
            state: CaptureState::Idle,
            elapsed_seconds: 0,
            video_enabled: true,
            audio_enabled: true,
            media: None,
            artifact: None,
            timer: None,
            timer_epoch: 0,
            acquiring: false,
            submitting: false,
            shut_down: false,
        };

        Self {
            config,
            device,
            submitter,
            created_at: Utc::now(),
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn question_id(&self) -> &str {
        &self.config.question_id
    }

    pub fn state(&self) -> CaptureState {
        self.inner.lock().state.clone()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.inner.lock().elapsed_seconds
    }

    pub fn video_enabled(&self) -> bool {
        self.inner.lock().video_enabled
    }

    pub fn audio_enabled(&self) -> bool {
        self.inner.lock().audio_enabled
    }

    pub fn has_media(&self) -> bool {
        self.inner.lock().media.is_some()
    }

    pub fn timer_active(&self) -> bool {
        self.inner.lock().timer.is_some()
    }

    /// Request the camera+microphone
    ///
    /// Device failures are not errors: they move the session to
    /// `PermissionDenied`, from which this may be called again. Errors are
    /// returned only for misuse (outstanding request, wrong state, shut down).
    /// Dropping the future before the device answers also lands in
    /// `PermissionDenied`.
    pub async fn acquire_media(&self) -> Result<CaptureState, SessionError> {
        let previous = {
            let mut inner = self.inner.lock();
            if inner.shut_down {
                return Err(SessionError::ShutDown);
            }
            if inner.acquiring {
                warn!("Session {}: media request already outstanding", inner.session_id);
                return Err(SessionError::AcquisitionPending);
            }
            if !inner.state.is_pre_recording() {
                return Err(inner.invalid("acquire media"));
            }

            inner.acquiring = true;
            inner.transition(CaptureState::AcquiringMedia);
            inner.media.take()
        };
        let guard = PendingGuard::new(&self.inner, Pending::Acquire);

        // Never hold two sources at once
        if let Some(mut source) = previous {
            release_source(&self.config.session_id, source.as_mut());
        }

        info!(
            "Session {}: requesting media from {}",
            self.config.session_id,
            self.device.name()
        );
        let result = self.device.acquire(self.config.constraints).await;
        guard.disarm();

        let mut inner = self.inner.lock();
        inner.acquiring = false;

        if inner.shut_down {
            if let Ok(mut source) = result {
                release_source(&inner.session_id, source.as_mut());
            }
            return Err(SessionError::ShutDown);
        }

        match result {
            Ok(mut source) => {
                source.set_enabled(TrackKind::Video, inner.video_enabled);
                source.set_enabled(TrackKind::Audio, inner.audio_enabled);
                info!(
                    "Session {}: media source {} bound ({} tracks)",
                    inner.session_id,
                    source.id(),
                    source.active_tracks()
                );
                inner.media = Some(source);
                inner.transition(CaptureState::Ready);
            }
            Err(e) => {
                warn!("Session {}: media acquisition failed: {}", inner.session_id, e);
                inner.transition(CaptureState::PermissionDenied {
                    reason: e.to_string(),
                });
            }
        }

        Ok(inner.state.clone())
    }

    /// Mute/unmute the camera; returns the new enabled value
    pub fn toggle_video(&self) -> Result<bool, SessionError> {
        self.toggle(TrackKind::Video)
    }

    /// Mute/unmute the microphone; returns the new enabled value
    pub fn toggle_mic(&self) -> Result<bool, SessionError> {
        self.toggle(TrackKind::Audio)
    }

    fn toggle(&self, kind: TrackKind) -> Result<bool, SessionError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let source = inner.media.as_mut().ok_or(SessionError::NoMediaSource)?;
        let flag = match kind {
            TrackKind::Video => &mut inner.video_enabled,
            TrackKind::Audio => &mut inner.audio_enabled,
        };
        *flag = !*flag;
        let touched = source.set_enabled(kind, *flag);

        debug!(
            "Session {}: {:?} {} ({} tracks)",
            inner.session_id,
            kind,
            if *flag { "enabled" } else { "disabled" },
            touched
        );
        Ok(*flag)
    }

    /// Start the recording and the elapsed-time counter
    ///
    /// Allowed before any recording has happened, including the preview-less
    /// `PermissionDenied` mode. Must be called from within a Tokio runtime.
    pub fn start_recording(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if inner.shut_down {
            return Err(SessionError::ShutDown);
        }
        if inner.state == CaptureState::Recording {
            return Err(SessionError::AlreadyRecording);
        }
        if !inner.state.is_pre_recording() {
            return Err(inner.invalid("start recording"));
        }

        inner.halt_timer();
        inner.elapsed_seconds = 0;
        let epoch = inner.timer_epoch;

        let capturing = match inner.media.as_mut() {
            Some(source) => {
                source.begin_capture();
                true
            }
            None => false,
        };
        if !capturing {
            warn!(
                "Session {}: recording without a media source",
                inner.session_id
            );
        }

        inner.transition(CaptureState::Recording);

        let weak = Arc::downgrade(&self.inner);
        inner.timer = Some(ElapsedTimer::start(TICK, move || tick(&weak, epoch)));

        Ok(())
    }

    /// Stop recording, release the device and submit the artifact
    ///
    /// Returns the outcome once the submission settles. Submission failures
    /// and timeouts land in `Failed`; they are not returned as errors.
    pub async fn stop_recording(&self) -> Result<SessionOutcome, SessionError> {
        self.stop_capture()?;
        self.submit_artifact().await
    }

    /// First half of `stop_recording`: `Recording -> Processing`
    ///
    /// Halts the timer, packages the artifact and releases the media source.
    pub fn stop_capture(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if inner.state != CaptureState::Recording {
            return Err(inner.invalid("stop recording"));
        }

        inner.halt_timer();

        let elapsed = inner.elapsed_seconds;
        let artifact = match inner.media.as_mut() {
            Some(source) => source.end_capture(elapsed),
            None => Artifact::empty(elapsed),
        };
        inner.release_media();

        info!(
            "Session {}: captured {} bytes over {}",
            inner.session_id,
            artifact.len(),
            format_elapsed(elapsed)
        );

        inner.artifact = Some(artifact);
        inner.transition(CaptureState::Processing);
        Ok(())
    }

    /// Second half of `stop_recording`: hand the artifact to the submission service
    ///
    /// Valid only in `Processing` with no other submission in flight. Dropping
    /// the future before the service answers fails the session with the
    /// artifact kept, so it can still be retried or discarded. A submission
    /// already in flight when the session is shut down still settles.
    pub async fn submit_artifact(&self) -> Result<SessionOutcome, SessionError> {
        let artifact = {
            let mut inner = self.inner.lock();
            if inner.state != CaptureState::Processing {
                return Err(inner.invalid("submit"));
            }
            if inner.submitting {
                return Err(SessionError::SubmissionInFlight);
            }
            let artifact = inner
                .artifact
                .clone()
                .ok_or(SessionError::NothingToSubmit)?;
            inner.submitting = true;
            artifact
        };
        let guard = PendingGuard::new(&self.inner, Pending::Submit);

        let timeout = self.config.submission_timeout;
        let result = tokio::time::timeout(
            timeout,
            self.submitter.submit(&self.config.session_id, &artifact),
        )
        .await;
        guard.disarm();

        let mut inner = self.inner.lock();
        inner.submitting = false;

        let outcome = match result {
            Ok(Ok(())) => {
                inner.artifact = None;
                inner.transition(CaptureState::Completed);
                SessionOutcome::Completed
            }
            Ok(Err(e)) => {
                error!("Session {}: submission failed: {}", inner.session_id, e);
                let reason = e.to_string();
                inner.transition(CaptureState::Failed {
                    reason: reason.clone(),
                });
                SessionOutcome::Failed { reason }
            }
            Err(_) => {
                error!(
                    "Session {}: submission timed out after {:?}",
                    inner.session_id, timeout
                );
                let reason = format!("submission timed out after {}s", timeout.as_secs());
                inner.transition(CaptureState::Failed {
                    reason: reason.clone(),
                });
                SessionOutcome::Failed { reason }
            }
        };

        Ok(outcome)
    }

    /// Re-submit the artifact of a `Failed` session
    pub async fn retry_submission(&self) -> Result<SessionOutcome, SessionError> {
        self.requeue_submission()?;
        self.submit_artifact().await
    }

    /// First half of `retry_submission`: `Failed -> Processing`
    pub fn requeue_submission(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if inner.shut_down {
            return Err(SessionError::ShutDown);
        }
        if !matches!(inner.state, CaptureState::Failed { .. }) {
            return Err(inner.invalid("retry submission"));
        }
        if inner.artifact.is_none() {
            return Err(SessionError::NothingToSubmit);
        }

        info!("Session {}: retrying submission", inner.session_id);
        inner.transition(CaptureState::Processing);
        Ok(())
    }

    /// Drop the artifact of a `Failed` session; it stays `Failed`
    pub fn discard(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if !matches!(inner.state, CaptureState::Failed { .. }) {
            return Err(inner.invalid("discard"));
        }

        if let Some(artifact) = inner.artifact.take() {
            info!(
                "Session {}: discarded artifact of {} bytes",
                inner.session_id,
                artifact.len()
            );
        }
        Ok(())
    }

    /// Tear down: halt the timer and release the media source
    ///
    /// Safe to call any number of times and from any state. Also runs on drop.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        if inner.shut_down {
            return;
        }

        inner.shut_down = true;
        inner.halt_timer();
        inner.release_media();
        info!(
            "Session {}: shut down in state {}",
            inner.session_id,
            inner.state.name()
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shut_down
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        SessionSnapshot {
            session_id: self.config.session_id.clone(),
            question_id: self.config.question_id.clone(),
            state: inner.state.clone(),
            elapsed_seconds: inner.elapsed_seconds,
            elapsed_display: format_elapsed(inner.elapsed_seconds),
            badge: self
                .config
                .language
                .recording_badge(inner.state == CaptureState::Recording),
            video_enabled: inner.video_enabled,
            audio_enabled: inner.audio_enabled,
            media_bound: inner.media.is_some(),
            active_tracks: inner.media.as_ref().map_or(0, |m| m.active_tracks()),
            artifact_bytes: inner.artifact.as_ref().map(Artifact::len),
            timer_active: inner.timer.is_some(),
            created_at: self.created_at,
        }
    }
}

impl Drop for InterviewSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
