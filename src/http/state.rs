use crate::api::{HistoryProvider, MockApi, QuestionProvider, ReportGenerator, SubmissionService};
use crate::config::{Config, SessionSettings};
use crate::media::{MediaDevice, SimulatedDevice};
use crate::session::{InterviewSession, SessionIdGenerator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live practice sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<InterviewSession>>>>,

    pub questions: Arc<dyn QuestionProvider>,
    pub submitter: Arc<dyn SubmissionService>,
    pub reports: Arc<dyn ReportGenerator>,
    pub history: Arc<dyn HistoryProvider>,

    /// Single camera+microphone device shared by every session of the process
    pub device: Arc<dyn MediaDevice>,

    pub ids: Arc<SessionIdGenerator>,
    pub settings: SessionSettings,
}

impl AppState {
    /// Wire every collaborator to one `MockApi`
    pub fn new(api: MockApi, device: Arc<dyn MediaDevice>, settings: SessionSettings) -> Self {
        let api = Arc::new(api);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            questions: api.clone(),
            submitter: api.clone(),
            reports: api.clone(),
            history: api,
            device,
            ids: Arc::new(SessionIdGenerator::new()),
            settings,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let device = SimulatedDevice::new(Duration::from_millis(cfg.media.acquire_latency_ms));
        Self::new(
            MockApi::new(cfg.api.latency()),
            Arc::new(device),
            cfg.session.clone(),
        )
    }

    pub fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.submission_timeout_secs)
    }
}
