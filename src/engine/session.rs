//! Session orchestration.
//!
//! `SessionController` owns the turn loop: persist the user message,
//! classify readiness, and either hand off to proposal generation or
//! plan the next question. The message log is the single source of
//! truth — nothing is derived from in-memory conversation state.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::model::{MessageRole, SessionMessage, SessionStatus};
use crate::engine::planner::QuestionPlanner;
use crate::engine::readiness::ReadinessClassifier;
use crate::error::{Result, SessionError};
use crate::store::Database;

/// Reply to a single conversational turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub message: String,
    pub ready_for_proposal: bool,
}

/// A freshly started session: its id plus the opening greeting.
#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub session_id: Uuid,
    pub message: String,
}

/// Drives the adaptive interview for all sessions.
pub struct SessionController {
    db: Arc<dyn Database>,
    planner: QuestionPlanner,
    readiness: ReadinessClassifier,
    config: EngineConfig,
}

impl SessionController {
    pub fn new(
        db: Arc<dyn Database>,
        planner: QuestionPlanner,
        readiness: ReadinessClassifier,
        config: EngineConfig,
    ) -> Self {
        Self {
            db,
            planner,
            readiness,
            config,
        }
    }

    /// Create a new active session and persist the fixed greeting as
    /// the first message.
    pub async fn start_session(&self) -> Result<StartedSession> {
        let session = crate::engine::model::Session::new();
        self.db.create_session(&session).await?;

        let greeting = self.planner.opening_question();
        self.db
            .append_message(session.id, MessageRole::Assistant, greeting)
            .await?;

        info!(session_id = %session.id, "Session started");
        Ok(StartedSession {
            session_id: session.id,
            message: greeting.to_string(),
        })
    }

    /// Process one user turn.
    ///
    /// The user message is persisted before any model call, so a
    /// downstream failure never loses what the owner typed. On the
    /// readiness turn the handoff message is returned but not appended
    /// to the log — the log stays a pure record of the interview.
    pub async fn handle_turn(&self, session_id: Uuid, user_message: &str) -> Result<TurnReply> {
        let session = self
            .db
            .get_session(session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))?;
        if session.status != SessionStatus::Active {
            return Err(SessionError::NotActive {
                id: session_id,
                status: session.status,
            }
            .into());
        }

        self.db
            .append_message(session_id, MessageRole::User, user_message)
            .await?;
        let history = self.db.list_messages(session_id).await?;

        if self.readiness.is_ready(&history).await? {
            info!(session_id = %session_id, turns = history.len(), "Session ready for proposal");
            return Ok(TurnReply {
                message: self.config.handoff_message.clone(),
                ready_for_proposal: true,
            });
        }

        let question = self.planner.next_question(&history).await?;
        self.db
            .append_message(session_id, MessageRole::Assistant, &question)
            .await?;

        Ok(TurnReply {
            message: question,
            ready_for_proposal: false,
        })
    }

    /// Full ordered message history for a session.
    pub async fn history(&self, session_id: Uuid) -> Result<Vec<SessionMessage>> {
        self.db
            .get_session(session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))?;
        Ok(self.db.list_messages(session_id).await?)
    }
}
