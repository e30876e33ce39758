pub mod api;
pub mod config;
pub mod http;
pub mod language;
pub mod media;
pub mod session;

pub use api::{
    ApiError, ApiLatency, EvaluationReport, HistoryEntry, MockApi, Question, QuestionProvider,
    ReportGenerator, SubmissionService,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use language::Language;
pub use media::{Artifact, MediaDevice, MediaError, MediaSource, SimulatedDevice, TrackKind};
pub use session::{
    CaptureState, InterviewSession, SessionConfig, SessionError, SessionIdGenerator,
    SessionOutcome, SessionSnapshot,
};
