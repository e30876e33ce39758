// Integration tests for the interview capture session
//
// These tests drive the session through its states against a simulated
// media device and scripted submission services, using Tokio's paused
// clock for the elapsed-time counter.

use anyhow::Result;
use mock_interview::api::{ApiError, ApiLatency, MockApi, SubmissionService};
use mock_interview::language::Language;
use mock_interview::media::{Artifact, MediaError, SimulatedDevice, TrackKind};
use mock_interview::session::{
    CaptureState, InterviewSession, SessionConfig, SessionError, SessionOutcome,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

/// Records every submission it receives
#[derive(Default)]
struct RecordingSubmitter {
    calls: Mutex<Vec<(String, usize)>>,
}

#[async_trait::async_trait]
impl SubmissionService for RecordingSubmitter {
    async fn submit(&self, session_id: &str, artifact: &Artifact) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), artifact.len()));
        Ok(())
    }
}

/// Fails the first `failures` submissions, then accepts
struct FlakySubmitter {
    failures: usize,
    attempts: AtomicUsize,
}

#[async_trait::async_trait]
impl SubmissionService for FlakySubmitter {
    async fn submit(&self, _session_id: &str, _artifact: &Artifact) -> Result<(), ApiError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Err(ApiError::Submission("upload rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Never answers within any reasonable timeout
struct StalledSubmitter;

#[async_trait::async_trait]
impl SubmissionService for StalledSubmitter {
    async fn submit(&self, _session_id: &str, _artifact: &Artifact) -> Result<(), ApiError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// Accepts every submission after `delay`
struct SlowSubmitter {
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowSubmitter {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl SubmissionService for SlowSubmitter {
    async fn submit(&self, _session_id: &str, _artifact: &Artifact) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

fn new_session(
    device: &SimulatedDevice,
    submitter: Arc<dyn SubmissionService>,
) -> InterviewSession {
    InterviewSession::new(
        SessionConfig::new("sess-1-1", "1"),
        Arc::new(device.clone()),
        submitter,
    )
}

fn instant_api() -> Arc<dyn SubmissionService> {
    Arc::new(MockApi::new(ApiLatency::zero()))
}

#[tokio::test]
async fn test_new_session_is_idle() {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());

    assert_eq!(session.state(), CaptureState::Idle);
    assert_eq!(session.elapsed_seconds(), 0);
    assert!(session.video_enabled());
    assert!(session.audio_enabled());
    assert!(!session.has_media());
}

#[tokio::test(start_paused = true)]
async fn test_full_practice_attempt_completes() -> Result<()> {
    let device = SimulatedDevice::instant();
    let submitter = Arc::new(RecordingSubmitter::default());
    let session = new_session(&device, submitter.clone());

    assert_eq!(session.acquire_media().await?, CaptureState::Ready);
    assert_eq!(device.bound_sources(), 1);

    session.start_recording()?;
    assert_eq!(session.state(), CaptureState::Recording);

    tokio::time::sleep(Duration::from_millis(45_500)).await;
    assert_eq!(session.elapsed_seconds(), 45);

    let outcome = session.stop_recording().await?;
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(session.state(), CaptureState::Completed);
    assert!(!session.has_media(), "Media source must be released");
    assert_eq!(device.active_tracks(), 0);
    assert!(!session.timer_active());

    let calls = submitter.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![("sess-1-1".to_string(), b"mock audio".len())]);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_frozen_outside_recording() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());

    session.acquire_media().await?;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.elapsed_seconds(), 0, "No counting while Ready");

    session.start_recording()?;
    tokio::time::sleep(Duration::from_millis(3_200)).await;
    session.stop_recording().await?;
    assert_eq!(session.elapsed_seconds(), 3);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(session.elapsed_seconds(), 3, "No counting after stop");

    Ok(())
}

#[tokio::test]
async fn test_permission_denied_then_retry_succeeds() -> Result<()> {
    let device = SimulatedDevice::instant();
    device.fail_next(MediaError::PermissionDenied);
    let session = new_session(&device, instant_api());

    let state = session.acquire_media().await?;
    assert!(matches!(state, CaptureState::PermissionDenied { .. }));
    assert!(!session.has_media());

    assert_eq!(session.acquire_media().await?, CaptureState::Ready);
    assert!(session.has_media());
    assert_eq!(device.bound_sources(), 1);

    session.start_recording()?;
    assert_eq!(session.stop_recording().await?, SessionOutcome::Completed);
    assert_eq!(device.bound_sources(), 0);

    Ok(())
}

#[tokio::test]
async fn test_device_unavailable_is_recoverable() -> Result<()> {
    let device = SimulatedDevice::instant();
    device.fail_next(MediaError::DeviceUnavailable("no camera attached".into()));
    let session = new_session(&device, instant_api());

    match session.acquire_media().await? {
        CaptureState::PermissionDenied { reason } => assert!(reason.contains("no camera")),
        other => panic!("unexpected state {:?}", other),
    }

    assert_eq!(session.acquire_media().await?, CaptureState::Ready);
    Ok(())
}

#[tokio::test]
async fn test_repeated_acquire_never_binds_two_sources() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());

    for _ in 0..5 {
        assert_eq!(session.acquire_media().await?, CaptureState::Ready);
        assert_eq!(device.bound_sources(), 1);
    }

    assert_eq!(device.granted_count(), 5);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_acquire_is_rejected() {
    let device = SimulatedDevice::new(Duration::from_secs(1));
    let session = new_session(&device, instant_api());

    let (first, second) = tokio::join!(session.acquire_media(), session.acquire_media());

    assert_eq!(first, Ok(CaptureState::Ready));
    assert_eq!(second, Err(SessionError::AcquisitionPending));
    assert_eq!(device.granted_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_acquisition_releases_late_grant() {
    let device = SimulatedDevice::new(Duration::from_secs(1));
    let session = new_session(&device, instant_api());

    let (acquired, _) = tokio::join!(session.acquire_media(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.shutdown();
    });

    assert_eq!(acquired, Err(SessionError::ShutDown));
    assert!(!session.has_media());
    assert_eq!(device.bound_sources(), 0);
}

#[tokio::test]
async fn test_toggle_parity_and_independence() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());
    session.acquire_media().await?;

    let sequence = [
        TrackKind::Video,
        TrackKind::Audio,
        TrackKind::Video,
        TrackKind::Video,
        TrackKind::Audio,
        TrackKind::Audio,
        TrackKind::Audio,
    ];

    for kind in sequence {
        let audio_before = session.audio_enabled();
        let video_before = session.video_enabled();
        match kind {
            TrackKind::Video => {
                assert_eq!(session.toggle_video()?, !video_before);
                assert_eq!(session.audio_enabled(), audio_before);
            }
            TrackKind::Audio => {
                assert_eq!(session.toggle_mic()?, !audio_before);
                assert_eq!(session.video_enabled(), video_before);
            }
        }
    }

    // 3 video toggles, 4 audio toggles
    assert!(!session.video_enabled());
    assert!(session.audio_enabled());
    assert_eq!(device.enabled_tracks(TrackKind::Video), 0);
    assert_eq!(device.enabled_tracks(TrackKind::Audio), 1);
    assert_eq!(device.active_tracks(), 2, "Muting must not release tracks");

    Ok(())
}

#[tokio::test]
async fn test_toggle_without_media_is_rejected() {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());

    assert_eq!(session.toggle_video(), Err(SessionError::NoMediaSource));
    assert_eq!(session.toggle_mic(), Err(SessionError::NoMediaSource));
    assert!(session.video_enabled());
    assert!(session.audio_enabled());
}

#[tokio::test]
async fn test_mute_preferences_survive_reacquire() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());

    session.acquire_media().await?;
    session.toggle_video()?;
    session.acquire_media().await?;

    assert!(!session.video_enabled());
    assert_eq!(device.enabled_tracks(TrackKind::Video), 0);
    assert_eq!(device.enabled_tracks(TrackKind::Audio), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_start_recording_twice_is_rejected() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());
    session.acquire_media().await?;

    session.start_recording()?;
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    assert_eq!(session.start_recording(), Err(SessionError::AlreadyRecording));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        session.elapsed_seconds(),
        3,
        "Rejected start must not reset or double count"
    );

    Ok(())
}

#[tokio::test]
async fn test_invalid_transitions() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());

    assert!(matches!(
        session.stop_recording().await,
        Err(SessionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.retry_submission().await,
        Err(SessionError::InvalidTransition { .. })
    ));

    session.acquire_media().await?;
    session.start_recording()?;
    assert!(matches!(
        session.acquire_media().await,
        Err(SessionError::InvalidTransition { .. })
    ));

    session.stop_recording().await?;
    assert!(matches!(
        session.start_recording(),
        Err(SessionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.stop_recording().await,
        Err(SessionError::InvalidTransition { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_submission_failure_is_terminal_and_clean() -> Result<()> {
    let device = SimulatedDevice::instant();
    let submitter = Arc::new(FlakySubmitter {
        failures: usize::MAX,
        attempts: AtomicUsize::new(0),
    });
    let session = new_session(&device, submitter);

    session.acquire_media().await?;
    session.start_recording()?;
    let outcome = session.stop_recording().await?;

    assert!(matches!(outcome, SessionOutcome::Failed { .. }));
    assert!(matches!(session.state(), CaptureState::Failed { .. }));
    assert!(!session.has_media());
    assert_eq!(device.bound_sources(), 0);
    assert!(!session.timer_active());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.artifact_bytes, Some(b"mock audio".len()));

    Ok(())
}

#[tokio::test]
async fn test_retry_after_failure_completes() -> Result<()> {
    let device = SimulatedDevice::instant();
    let submitter = Arc::new(FlakySubmitter {
        failures: 1,
        attempts: AtomicUsize::new(0),
    });
    let session = new_session(&device, submitter.clone());

    session.acquire_media().await?;
    session.start_recording()?;
    assert!(matches!(
        session.stop_recording().await?,
        SessionOutcome::Failed { .. }
    ));

    assert_eq!(session.retry_submission().await?, SessionOutcome::Completed);
    assert_eq!(session.state(), CaptureState::Completed);
    assert_eq!(submitter.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(session.snapshot().artifact_bytes, None);

    Ok(())
}

#[tokio::test]
async fn test_discard_drops_artifact() -> Result<()> {
    let device = SimulatedDevice::instant();
    let submitter = Arc::new(FlakySubmitter {
        failures: usize::MAX,
        attempts: AtomicUsize::new(0),
    });
    let session = new_session(&device, submitter);

    session.acquire_media().await?;
    session.start_recording()?;
    session.stop_recording().await?;

    session.discard()?;
    assert!(matches!(session.state(), CaptureState::Failed { .. }));
    assert_eq!(session.snapshot().artifact_bytes, None);
    assert_eq!(
        session.retry_submission().await,
        Err(SessionError::NothingToSubmit)
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_submission_timeout_fails_session() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = InterviewSession::new(
        SessionConfig::new("sess-2-1", "2").with_submission_timeout(Duration::from_secs(5)),
        Arc::new(device.clone()),
        Arc::new(StalledSubmitter),
    );

    session.acquire_media().await?;
    session.start_recording()?;

    match session.stop_recording().await? {
        SessionOutcome::Failed { reason } => assert!(reason.contains("timed out")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(matches!(session.state(), CaptureState::Failed { .. }));
    assert_eq!(device.bound_sources(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_recording_without_media_submits_empty_artifact() -> Result<()> {
    let device = SimulatedDevice::instant();
    device.fail_next(MediaError::PermissionDenied);
    let submitter = Arc::new(RecordingSubmitter::default());
    let session = new_session(&device, submitter.clone());

    session.acquire_media().await?;
    session.start_recording()?;
    tokio::time::sleep(Duration::from_millis(2_100)).await;

    assert_eq!(session.stop_recording().await?, SessionOutcome::Completed);
    assert_eq!(session.elapsed_seconds(), 2);

    let calls = submitter.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![("sess-1-1".to_string(), 0)]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_recording_releases_everything() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, instant_api());

    session.acquire_media().await?;
    session.start_recording()?;
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    session.shutdown();
    session.shutdown();

    assert!(session.is_shut_down());
    assert!(!session.timer_active());
    assert_eq!(device.bound_sources(), 0);

    let frozen = session.elapsed_seconds();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(session.elapsed_seconds(), frozen);

    assert_eq!(session.start_recording(), Err(SessionError::ShutDown));
    assert_eq!(session.acquire_media().await, Err(SessionError::ShutDown));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_drop_releases_media_and_stale_timer_is_harmless() -> Result<()> {
    let device = SimulatedDevice::instant();
    {
        let session = new_session(&device, instant_api());
        session.acquire_media().await?;
        session.start_recording()?;
        tokio::time::sleep(Duration::from_millis(1_500)).await;
    }

    assert_eq!(device.bound_sources(), 0);

    // Any tick still scheduled must find nothing to mutate
    tokio::time::sleep(Duration::from_secs(5)).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_acquisition_can_be_retried() -> Result<()> {
    let device = SimulatedDevice::new(Duration::from_secs(1));
    let session = new_session(&device, instant_api());

    let abandoned = timeout(Duration::from_millis(100), session.acquire_media()).await;
    assert!(abandoned.is_err(), "Device answers after the caller gave up");

    assert_eq!(
        session.state(),
        CaptureState::PermissionDenied {
            reason: "media request cancelled".to_string()
        }
    );
    assert_eq!(device.bound_sources(), 0);

    assert_eq!(session.acquire_media().await?, CaptureState::Ready);
    assert_eq!(device.bound_sources(), 1);
    session.start_recording()?;
    assert_eq!(session.state(), CaptureState::Recording);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_submission_can_be_retried() -> Result<()> {
    let device = SimulatedDevice::instant();
    let submitter = Arc::new(SlowSubmitter::new(Duration::from_secs(2)));
    let session = new_session(&device, submitter.clone());

    session.acquire_media().await?;
    session.start_recording()?;

    let abandoned = timeout(Duration::from_millis(100), session.stop_recording()).await;
    assert!(abandoned.is_err(), "Upload outlives the caller");

    assert_eq!(
        session.state(),
        CaptureState::Failed {
            reason: "submission cancelled".to_string()
        }
    );
    assert!(
        session.snapshot().artifact_bytes.is_some(),
        "Artifact must be kept for a retry"
    );
    assert_eq!(device.bound_sources(), 0);

    // Nothing settles later behind the session's back
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(matches!(session.state(), CaptureState::Failed { .. }));

    assert_eq!(session.retry_submission().await?, SessionOutcome::Completed);
    assert_eq!(submitter.calls.load(Ordering::SeqCst), 2);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_submission_can_be_discarded() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = new_session(&device, Arc::new(SlowSubmitter::new(Duration::from_secs(2))));

    session.acquire_media().await?;
    session.start_recording()?;
    session.stop_capture()?;

    assert!(timeout(Duration::from_millis(100), session.submit_artifact())
        .await
        .is_err());

    session.discard()?;
    assert_eq!(session.snapshot().artifact_bytes, None);
    assert_eq!(
        session.requeue_submission(),
        Err(SessionError::NothingToSubmit)
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_processing_is_observable_and_double_submit_rejected() -> Result<()> {
    let device = SimulatedDevice::instant();
    let submitter = Arc::new(SlowSubmitter::new(Duration::from_secs(2)));
    let session = new_session(&device, submitter.clone());

    session.acquire_media().await?;
    session.start_recording()?;
    tokio::time::sleep(Duration::from_millis(3_100)).await;

    session.stop_capture()?;
    assert_eq!(session.state(), CaptureState::Processing);
    assert!(!session.has_media(), "Device is released as capture ends");
    assert!(!session.timer_active());
    assert_eq!(device.bound_sources(), 0);
    assert!(session.snapshot().artifact_bytes.is_some());

    let (first, second, mid_upload) = tokio::join!(
        session.submit_artifact(),
        session.submit_artifact(),
        async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            session.state()
        }
    );

    assert_eq!(first, Ok(SessionOutcome::Completed));
    assert_eq!(second, Err(SessionError::SubmissionInFlight));
    assert_eq!(mid_upload, CaptureState::Processing);

    assert_eq!(session.state(), CaptureState::Completed);
    assert_eq!(session.elapsed_seconds(), 3);
    assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_processing_lets_submission_settle() -> Result<()> {
    let device = SimulatedDevice::instant();
    let submitter = Arc::new(SlowSubmitter::new(Duration::from_secs(2)));
    let session = new_session(&device, submitter.clone());

    session.acquire_media().await?;
    session.start_recording()?;
    session.stop_capture()?;

    let (outcome, ()) = tokio::join!(session.submit_artifact(), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.shutdown();
    });

    // The artifact was already handed over; teardown does not revoke it
    assert_eq!(outcome, Ok(SessionOutcome::Completed));
    assert_eq!(session.state(), CaptureState::Completed);
    assert!(session.is_shut_down());
    assert_eq!(device.bound_sources(), 0);
    assert_eq!(session.acquire_media().await, Err(SessionError::ShutDown));

    Ok(())
}

#[tokio::test]
async fn test_release_error_does_not_block_teardown() -> Result<()> {
    let device = SimulatedDevice::instant();
    device.fail_next_release("camera track hung");
    let session = new_session(&device, instant_api());

    session.acquire_media().await?;
    session.shutdown();

    assert!(session.is_shut_down());
    assert!(!session.has_media());
    assert_eq!(device.bound_sources(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_release_error_does_not_block_submission() -> Result<()> {
    let device = SimulatedDevice::instant();
    device.fail_next_release("microphone track hung");
    let session = new_session(&device, instant_api());

    session.acquire_media().await?;
    session.start_recording()?;

    assert_eq!(session.stop_recording().await?, SessionOutcome::Completed);
    assert_eq!(device.bound_sources(), 0);

    Ok(())
}

#[tokio::test]
async fn test_badge_follows_state_and_language() -> Result<()> {
    let device = SimulatedDevice::instant();
    let session = InterviewSession::new(
        SessionConfig::new("sess-3-1", "3").with_language(Language::Zh),
        Arc::new(device.clone()),
        instant_api(),
    );

    session.acquire_media().await?;
    assert_eq!(session.snapshot().badge, "准备就绪");

    session.start_recording()?;
    assert_eq!(session.snapshot().badge, "录制中");

    session.shutdown();
    Ok(())
}
