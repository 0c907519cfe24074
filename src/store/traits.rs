//! Unified `Database` trait — single async interface for all persistence.
//!
//! Each operation is a single atomic unit; no multi-step distributed
//! transaction is assumed across them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::model::{MessageRole, Session, SessionFlag, SessionMessage, SessionStatus};
use crate::error::DatabaseError;
use crate::proposal::model::{ProfileRecord, Proposal};

/// Backend-agnostic database trait covering sessions, messages,
/// profiles, and proposals.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Sessions ────────────────────────────────────────────────────

    async fn create_session(&self, session: &Session) -> Result<(), DatabaseError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, DatabaseError>;

    /// Explicit lifecycle transition. The caller decides the target
    /// status; the store records it together with the completion time.
    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError>;

    /// Record captured business identity fields on the session.
    async fn update_session_capture(
        &self,
        id: Uuid,
        business_name: &str,
        industry: &str,
    ) -> Result<(), DatabaseError>;

    /// Set a downstream side-effect flag.
    async fn set_session_flag(&self, id: Uuid, flag: SessionFlag) -> Result<(), DatabaseError>;

    // ── Messages ────────────────────────────────────────────────────

    /// Append a message with the next per-session order value.
    ///
    /// Order allocation and insert are one atomic statement — the
    /// read-max-then-insert race is closed structurally, not handled
    /// after the fact.
    async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<SessionMessage, DatabaseError>;

    /// All messages for a session, ascending by order.
    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<SessionMessage>, DatabaseError>;

    // ── Profiles ────────────────────────────────────────────────────

    async fn create_profile(&self, record: &ProfileRecord) -> Result<(), DatabaseError>;

    async fn get_profile_by_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<ProfileRecord>, DatabaseError>;

    // ── Proposals ───────────────────────────────────────────────────

    async fn create_proposal(&self, proposal: &Proposal) -> Result<(), DatabaseError>;

    async fn get_proposal_by_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<Proposal>, DatabaseError>;

    /// Record externally-uploaded-artifact identifiers. The proposal
    /// content itself is never mutated after creation.
    async fn set_proposal_artifacts(
        &self,
        id: Uuid,
        drive_file_id: Option<&str>,
        pdf_generated: bool,
    ) -> Result<(), DatabaseError>;
}
