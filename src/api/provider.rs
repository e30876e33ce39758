use super::models::{EvaluationReport, HistoryEntry, Question};
use crate::language::Language;
use crate::media::Artifact;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("question {0} not found")]
    NotFound(String),

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Question bank lookup
#[async_trait::async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn list_questions(&self, language: Language) -> Result<Vec<Question>, ApiError>;

    /// `ApiError::NotFound` when the id does not resolve
    async fn fetch_question(&self, id: &str, language: Language) -> Result<Question, ApiError>;
}

/// Upload + transcription + scoring pipeline entry point
#[async_trait::async_trait]
pub trait SubmissionService: Send + Sync {
    async fn submit(&self, session_id: &str, artifact: &Artifact) -> Result<(), ApiError>;
}

#[async_trait::async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(
        &self,
        session_id: &str,
        language: Language,
    ) -> Result<EvaluationReport, ApiError>;
}

#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn history(&self, language: Language) -> Result<Vec<HistoryEntry>, ApiError>;
}
