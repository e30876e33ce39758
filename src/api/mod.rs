//! Collaborators consumed by the interview session
//!
//! The session treats each of these as an opaque async operation with a single
//! success/failure outcome. `MockApi` implements all of them in memory.

pub mod mock;
pub mod models;
pub mod provider;

pub use mock::{ApiLatency, MockApi};
pub use models::{
    filter_questions, Category, Difficulty, DimensionScore, EvaluationDetails, EvaluationReport,
    HistoryEntry, HistoryStatus, Question, QuestionFilter, SuggestedPractice,
};
pub use provider::{ApiError, HistoryProvider, QuestionProvider, ReportGenerator, SubmissionService};
