//! HTTP API consumed by the practice UI
//!
//! - GET /health - Health check
//! - GET /questions, GET /questions/:id - Question bank (`?lang=en|zh`)
//! - GET /history - Past practice sessions
//! - POST /sessions - Open a question for practice
//! - GET|DELETE /sessions/:id - Query / tear down a session
//! - POST /sessions/:id/media/{acquire,video/toggle,mic/toggle} - Media controls
//! - POST /sessions/:id/recording/{start,stop} - Recording control
//! - POST /sessions/:id/submission/{retry,discard} - Failed submission handling
//! - GET /sessions/:id/report - Evaluation report of a completed session

mod handlers;
mod routes;
mod state;

pub use handlers::{CreateSessionRequest, CreateSessionResponse, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
