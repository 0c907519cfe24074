//! REST endpoints for the intake chat.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::error;
use uuid::Uuid;

use crate::engine::SessionController;
use crate::error::{Error, SessionError};
use crate::proposal::ProposalGenerator;

/// Shared state for the chat routes.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
    pub generator: Arc<ProposalGenerator>,
}

/// Maps engine errors to HTTP responses.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Session(SessionError::NotActive { .. })
            | Error::Session(SessionError::NotReady { .. }) => StatusCode::CONFLICT,
            Error::Llm(_) | Error::Extraction(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::BAD_GATEWAY {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    session_id: Uuid,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProposalRequest {
    session_id: Uuid,
}

#[derive(Debug, Serialize)]
struct HistoryEntry {
    role: String,
    content: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// POST /api/chat/start
///
/// Creates a new session and returns its id with the opening greeting.
async fn start_chat(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let started = state.controller.start_session().await?;
    Ok(Json(started))
}

/// POST /api/chat/message
///
/// Processes one user turn. Returns either the next question or the
/// handoff message with `ready_for_proposal: true`.
async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = state.controller.handle_turn(req.session_id, &req.message).await?;
    Ok(Json(reply))
}

/// GET /api/chat/history/{session_id}
///
/// Returns the full ordered message history for a session.
async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state.controller.history(session_id).await?;
    let entries: Vec<HistoryEntry> = messages
        .into_iter()
        .map(|m| HistoryEntry {
            role: m.role.as_str().to_string(),
            content: m.content,
            timestamp: m.created_at,
        })
        .collect();
    Ok(Json(entries))
}

/// POST /api/chat/proposal
///
/// Generates (or returns the stored) proposal for a session.
async fn generate_proposal(
    State(state): State<AppState>,
    Json(req): Json<ProposalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let proposal = state.generator.generate(req.session_id).await?;
    Ok(Json(proposal))
}

/// Build the chat REST routes.
pub fn chat_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat/start", post(start_chat))
        .route("/api/chat/message", post(send_message))
        .route("/api/chat/history/{session_id}", get(get_history))
        .route("/api/chat/proposal", post(generate_proposal))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
