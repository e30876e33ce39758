use super::state::AppState;
use crate::api::{filter_questions, ApiError, Category, Question, QuestionFilter};
use crate::language::Language;
use crate::session::{
    CaptureState, InterviewSession, SessionConfig, SessionError, SessionSnapshot,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<Language>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestionQuery {
    pub lang: Option<Language>,
    pub category: Option<Category>,
    /// Free-text search over title and tags
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub question_id: String,

    /// Content language (defaults to the configured one)
    pub lang: Option<Language>,

    /// Optional caller-supplied session ID (generated otherwise)
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session: SessionSnapshot,
    pub question: Question,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Every session error is a request that does not fit the current state
fn session_error(e: SessionError) -> Response {
    error_response(StatusCode::CONFLICT, e.to_string())
}

fn api_error(e: ApiError) -> Response {
    match e {
        ApiError::NotFound(_) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        _ => {
            error!("Collaborator call failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn find_session(
    state: &AppState,
    session_id: &str,
) -> Result<Arc<InterviewSession>, Response> {
    let sessions = state.sessions.read().await;
    sessions.get(session_id).cloned().ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        )
    })
}

fn spawn_submission(session: Arc<InterviewSession>) {
    tokio::spawn(async move {
        match session.submit_artifact().await {
            Ok(outcome) => info!(
                "Submission for session {} settled: {:?}",
                session.session_id(),
                outcome
            ),
            Err(e) => warn!(
                "Submission for session {} not started: {}",
                session.session_id(),
                e
            ),
        }
    });
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /questions?lang=&category=&q=
/// List the question bank
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<QuestionQuery>,
) -> impl IntoResponse {
    let lang = query.lang.unwrap_or(state.settings.default_language);

    match state.questions.list_questions(lang).await {
        Ok(questions) => {
            let filter = QuestionFilter {
                category: query.category,
                text: query.q,
            };
            (StatusCode::OK, Json(filter_questions(questions, &filter))).into_response()
        }
        Err(e) => api_error(e),
    }
}

/// GET /questions/:question_id?lang=
pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    Query(query): Query<LanguageQuery>,
) -> impl IntoResponse {
    let lang = query.lang.unwrap_or(state.settings.default_language);

    match state.questions.fetch_question(&question_id, lang).await {
        Ok(question) => (StatusCode::OK, Json(question)).into_response(),
        Err(e) => api_error(e),
    }
}

/// GET /history?lang=
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> impl IntoResponse {
    let lang = query.lang.unwrap_or(state.settings.default_language);

    match state.history.history(lang).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => api_error(e),
    }
}

/// POST /sessions
/// Open a question for practice: load its content and acquire media concurrently
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let lang = req.lang.unwrap_or(state.settings.default_language);
    let session_id = req
        .session_id
        .unwrap_or_else(|| state.ids.next_for(&req.question_id));

    info!(
        "Opening session {} for question {}",
        session_id, req.question_id
    );

    {
        let sessions = state.sessions.read().await;
        if sessions.contains_key(&session_id) {
            return error_response(
                StatusCode::CONFLICT,
                format!("Session {} already exists", session_id),
            );
        }
    }

    let config = SessionConfig::new(session_id.clone(), req.question_id.clone())
        .with_submission_timeout(state.submission_timeout())
        .with_language(lang);
    let session = Arc::new(InterviewSession::new(
        config,
        Arc::clone(&state.device),
        Arc::clone(&state.submitter),
    ));

    // Either may complete first
    let (question, acquired) = tokio::join!(
        state.questions.fetch_question(&req.question_id, lang),
        session.acquire_media()
    );

    let question = match question {
        Ok(q) => q,
        Err(e) => {
            // No session is started for an unknown question
            session.shutdown();
            return api_error(e);
        }
    };

    if let Err(e) = acquired {
        warn!("Session {}: initial media request rejected: {}", session_id, e);
    }

    {
        let mut sessions = state.sessions.write().await;
        if sessions.contains_key(&session_id) {
            session.shutdown();
            return error_response(
                StatusCode::CONFLICT,
                format!("Session {} already exists", session_id),
            );
        }
        sessions.insert(session_id.clone(), Arc::clone(&session));
    }

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session: session.snapshot(),
            question,
        }),
    )
        .into_response()
}

/// GET /sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Ok(session) => (StatusCode::OK, Json(session.snapshot())).into_response(),
        Err(response) => response,
    }
}

/// DELETE /sessions/:session_id
/// Navigate away: tear the session down and release the device
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match session {
        Some(session) => {
            session.shutdown();
            info!("Session {} closed", session_id);
            (StatusCode::OK, Json(session.snapshot())).into_response()
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
    }
}

/// POST /sessions/:session_id/media/acquire
/// Retry media acquisition (e.g. after a permission prompt was declined)
pub async fn acquire_media(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match find_session(&state, &session_id).await {
        Ok(s) => s,
        Err(response) => return response,
    };

    match session.acquire_media().await {
        Ok(_) => (StatusCode::OK, Json(session.snapshot())).into_response(),
        Err(e) => session_error(e),
    }
}

/// POST /sessions/:session_id/media/video/toggle
pub async fn toggle_video(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match find_session(&state, &session_id).await {
        Ok(s) => s,
        Err(response) => return response,
    };

    match session.toggle_video() {
        Ok(_) => (StatusCode::OK, Json(session.snapshot())).into_response(),
        Err(e) => session_error(e),
    }
}

/// POST /sessions/:session_id/media/mic/toggle
pub async fn toggle_mic(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match find_session(&state, &session_id).await {
        Ok(s) => s,
        Err(response) => return response,
    };

    match session.toggle_mic() {
        Ok(_) => (StatusCode::OK, Json(session.snapshot())).into_response(),
        Err(e) => session_error(e),
    }
}

/// POST /sessions/:session_id/recording/start
pub async fn start_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match find_session(&state, &session_id).await {
        Ok(s) => s,
        Err(response) => return response,
    };

    match session.start_recording() {
        Ok(()) => (StatusCode::OK, Json(session.snapshot())).into_response(),
        Err(e) => session_error(e),
    }
}

/// POST /sessions/:session_id/recording/stop
/// Stop recording; the submission runs in the background and the state is polled
pub async fn stop_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match find_session(&state, &session_id).await {
        Ok(s) => s,
        Err(response) => return response,
    };

    if let Err(e) = session.stop_capture() {
        return session_error(e);
    }

    let snapshot = session.snapshot();
    spawn_submission(session);

    (StatusCode::ACCEPTED, Json(snapshot)).into_response()
}

/// POST /sessions/:session_id/submission/retry
pub async fn retry_submission(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match find_session(&state, &session_id).await {
        Ok(s) => s,
        Err(response) => return response,
    };

    if let Err(e) = session.requeue_submission() {
        return session_error(e);
    }

    let snapshot = session.snapshot();
    spawn_submission(session);

    (StatusCode::ACCEPTED, Json(snapshot)).into_response()
}

/// POST /sessions/:session_id/submission/discard
pub async fn discard_submission(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match find_session(&state, &session_id).await {
        Ok(s) => s,
        Err(response) => return response,
    };

    match session.discard() {
        Ok(()) => (StatusCode::OK, Json(session.snapshot())).into_response(),
        Err(e) => session_error(e),
    }
}

/// GET /sessions/:session_id/report?lang=
/// Generate the evaluation report; the session is closed once it is obtained
pub async fn get_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<LanguageQuery>,
) -> impl IntoResponse {
    let lang = query.lang.unwrap_or(state.settings.default_language);

    // Claim the session before generating so a report is produced at most once
    let session = {
        let mut sessions = state.sessions.write().await;
        let entry = match sessions.entry(session_id.clone()) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    format!("Session {} not found", session_id),
                )
            }
        };

        let current = entry.get().state();
        if !current.is_terminal() {
            return error_response(
                StatusCode::CONFLICT,
                format!(
                    "Session {} has no report yet while {}",
                    session_id,
                    current.name()
                ),
            );
        }
        if current != CaptureState::Completed {
            return error_response(
                StatusCode::CONFLICT,
                format!("Session {} failed its submission; retry or discard", session_id),
            );
        }

        entry.remove()
    };

    match state.reports.generate(&session_id, lang).await {
        Ok(report) => {
            session.shutdown();
            info!("Report {} delivered for session {}", report.id, session_id);
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            // Put it back so the report can be requested again
            state
                .sessions
                .write()
                .await
                .insert(session_id.clone(), session);
            api_error(e)
        }
    }
}
