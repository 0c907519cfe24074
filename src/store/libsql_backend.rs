//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. `libsql::Connection` is
//! `Send + Sync` and safe for concurrent async use.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::model::{MessageRole, Session, SessionFlag, SessionMessage, SessionStatus};
use crate::error::DatabaseError;
use crate::proposal::model::{
    BusinessProfile, BusinessSize, PricingTier, ProfileRecord, Proposal, ProposalContent,
};
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 datetime string (our canonical write format).
/// A stored value that does not parse is row corruption and surfaces
/// as an error rather than a sentinel timestamp.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Serialization(format!("invalid stored datetime {s:?}: {e}")))
}

fn parse_optional_datetime(s: &Option<String>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) => Ok(Some(parse_datetime(s)?)),
        None => Ok(None),
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s)
        .map_err(|e| DatabaseError::Serialization(format!("invalid stored uuid {s:?}: {e}")))
}

/// Convert `Option<&str>` to a libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn list_to_json(list: &[String]) -> Result<String, DatabaseError> {
    serde_json::to_string(list).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn list_from_json(s: &str) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

/// Map a libsql Row to a Session.
///
/// Column order matches SESSION_COLUMNS:
/// 0:id, 1:status, 2:business_name, 3:industry, 4:contact_email,
/// 5:contact_phone, 6:proposal_generated, 7:profile_uploaded,
/// 8:booking_completed, 9:created_at, 10:completed_at
fn row_to_session(row: &libsql::Row) -> Result<Session, DatabaseError> {
    let err = |e: libsql::Error| DatabaseError::Query(format!("session row parse: {e}"));

    let id: String = row.get(0).map_err(err)?;
    let status: String = row.get(1).map_err(err)?;
    let created_str: String = row.get(9).map_err(err)?;
    let completed_str: Option<String> = row.get(10).ok();

    Ok(Session {
        id: parse_uuid(&id)?,
        status: SessionStatus::parse(&status),
        business_name: row.get(2).ok(),
        industry: row.get(3).ok(),
        contact_email: row.get(4).ok(),
        contact_phone: row.get(5).ok(),
        proposal_generated: row.get::<i64>(6).map_err(err)? != 0,
        profile_uploaded: row.get::<i64>(7).map_err(err)? != 0,
        booking_completed: row.get::<i64>(8).map_err(err)? != 0,
        created_at: parse_datetime(&created_str)?,
        completed_at: parse_optional_datetime(&completed_str)?,
    })
}

/// Map a libsql Row to a SessionMessage.
///
/// Column order: 0:id, 1:session_id, 2:role, 3:content,
/// 4:message_order, 5:created_at
fn row_to_message(row: &libsql::Row) -> Result<SessionMessage, DatabaseError> {
    let err = |e: libsql::Error| DatabaseError::Query(format!("message row parse: {e}"));

    let id: String = row.get(0).map_err(err)?;
    let session_id: String = row.get(1).map_err(err)?;
    let role: String = row.get(2).map_err(err)?;
    let created_str: String = row.get(5).map_err(err)?;

    Ok(SessionMessage {
        id: parse_uuid(&id)?,
        session_id: parse_uuid(&session_id)?,
        role: MessageRole::parse(&role),
        content: row.get(3).map_err(err)?,
        message_order: row.get(4).map_err(err)?,
        created_at: parse_datetime(&created_str)?,
    })
}

/// Map a libsql Row to a ProfileRecord.
///
/// Column order matches PROFILE_COLUMNS.
fn row_to_profile(row: &libsql::Row) -> Result<ProfileRecord, DatabaseError> {
    let err = |e: libsql::Error| DatabaseError::Query(format!("profile row parse: {e}"));

    let id: String = row.get(0).map_err(err)?;
    let session_id: String = row.get(1).map_err(err)?;
    let business_size: Option<String> = row.get(4).ok();
    let created_str: String = row.get(10).map_err(err)?;

    let pain_points: String = row.get(5).map_err(err)?;
    let time_wasters: String = row.get(6).map_err(err)?;
    let bottlenecks: String = row.get(7).map_err(err)?;
    let automation: String = row.get(8).map_err(err)?;
    let cs_challenges: String = row.get(9).map_err(err)?;

    Ok(ProfileRecord {
        id: parse_uuid(&id)?,
        session_id: parse_uuid(&session_id)?,
        profile: BusinessProfile {
            business_name: row.get(2).map_err(err)?,
            industry: row.get(3).map_err(err)?,
            business_size: business_size.as_deref().and_then(BusinessSize::parse),
            main_pain_points: list_from_json(&pain_points)?,
            time_wasters: list_from_json(&time_wasters)?,
            bottlenecks: list_from_json(&bottlenecks)?,
            automation_opportunities: list_from_json(&automation)?,
            customer_service_challenges: list_from_json(&cs_challenges)?,
        },
        created_at: parse_datetime(&created_str)?,
    })
}

/// Map a libsql Row to a Proposal.
///
/// Column order matches PROPOSAL_COLUMNS.
fn row_to_proposal(row: &libsql::Row) -> Result<Proposal, DatabaseError> {
    let err = |e: libsql::Error| DatabaseError::Query(format!("proposal row parse: {e}"));

    let id: String = row.get(0).map_err(err)?;
    let session_id: String = row.get(1).map_err(err)?;
    let profile_id: String = row.get(2).map_err(err)?;
    let pricing_tier: String = row.get(3).map_err(err)?;
    let agents_json: String = row.get(4).map_err(err)?;
    let benefits: String = row.get(7).map_err(err)?;
    let tech_reqs: String = row.get(8).map_err(err)?;
    let integrations: String = row.get(9).map_err(err)?;
    let created_str: String = row.get(14).map_err(err)?;

    let recommended_agents = serde_json::from_str(&agents_json)
        .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

    Ok(Proposal {
        id: parse_uuid(&id)?,
        session_id: parse_uuid(&session_id)?,
        profile_id: parse_uuid(&profile_id)?,
        content: ProposalContent {
            pricing_tier: PricingTier::parse(&pricing_tier),
            recommended_agents,
            implementation_timeline: row.get(5).map_err(err)?,
            estimated_cost: row.get(6).ok(),
            key_benefits: list_from_json(&benefits)?,
            technical_requirements: list_from_json(&tech_reqs)?,
            integration_points: list_from_json(&integrations)?,
            proposal_summary: row.get(10).map_err(err)?,
            full_proposal_content: row.get(11).map_err(err)?,
        },
        drive_file_id: row.get(12).ok(),
        pdf_generated: row.get::<i64>(13).map_err(err)? != 0,
        created_at: parse_datetime(&created_str)?,
    })
}

// ── Trait implementation ────────────────────────────────────────────

const SESSION_COLUMNS: &str = "id, status, business_name, industry, contact_email, contact_phone, \
    proposal_generated, profile_uploaded, booking_completed, created_at, completed_at";

const MESSAGE_COLUMNS: &str = "id, session_id, role, content, message_order, created_at";

const PROFILE_COLUMNS: &str = "id, session_id, business_name, industry, business_size, \
    main_pain_points, time_wasters, bottlenecks, automation_opportunities, \
    customer_service_challenges, created_at";

const PROPOSAL_COLUMNS: &str = "id, session_id, business_profile_id, pricing_tier, \
    recommended_agents, implementation_timeline, estimated_cost, key_benefits, \
    technical_requirements, integration_points, proposal_summary, full_proposal_content, \
    drive_file_id, pdf_generated, created_at";

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Sessions ────────────────────────────────────────────────────

    async fn create_session(&self, session: &Session) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO chat_sessions (id, status, business_name, industry, contact_email, \
                 contact_phone, proposal_generated, profile_uploaded, booking_completed, \
                 created_at, completed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    session.id.to_string(),
                    session.status.as_str(),
                    opt_text(session.business_name.as_deref()),
                    opt_text(session.industry.as_deref()),
                    opt_text(session.contact_email.as_deref()),
                    opt_text(session.contact_phone.as_deref()),
                    session.proposal_generated as i64,
                    session.profile_uploaded as i64,
                    session.booking_completed as i64,
                    session.created_at.to_rfc3339(),
                    opt_text(session.completed_at.map(|t| t.to_rfc3339()).as_deref()),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_session: {e}")))?;

        debug!(session_id = %session.id, "Session created");
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_session: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_session: {e}")))?
        {
            Some(row) => Ok(Some(row_to_session(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE chat_sessions SET status = ?1, completed_at = ?2 WHERE id = ?3",
                params![
                    status.as_str(),
                    opt_text(completed_at.map(|t| t.to_rfc3339()).as_deref()),
                    id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_session_status: {e}")))?;

        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "session".to_string(),
                id: id.to_string(),
            });
        }
        debug!(session_id = %id, status = %status, "Session status updated");
        Ok(())
    }

    async fn update_session_capture(
        &self,
        id: Uuid,
        business_name: &str,
        industry: &str,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "UPDATE chat_sessions SET business_name = ?1, industry = ?2 WHERE id = ?3",
                params![business_name, industry, id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_session_capture: {e}")))?;
        Ok(())
    }

    async fn set_session_flag(&self, id: Uuid, flag: SessionFlag) -> Result<(), DatabaseError> {
        let column = match flag {
            SessionFlag::ProposalGenerated => "proposal_generated",
            SessionFlag::ProfileUploaded => "profile_uploaded",
            SessionFlag::BookingCompleted => "booking_completed",
        };
        self.conn()
            .execute(
                &format!("UPDATE chat_sessions SET {column} = 1 WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_session_flag: {e}")))?;
        Ok(())
    }

    // ── Messages ────────────────────────────────────────────────────

    async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<SessionMessage, DatabaseError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        // Order allocation and insert as one statement: the next order
        // value is computed inside the INSERT itself, so two overlapping
        // appends can never read the same max.
        self.conn()
            .execute(
                "INSERT INTO chat_messages (id, session_id, role, content, message_order, created_at) \
                 SELECT ?1, ?2, ?3, ?4, COALESCE(MAX(message_order), 0) + 1, ?5 \
                 FROM chat_messages WHERE session_id = ?2",
                params![
                    id.to_string(),
                    session_id.to_string(),
                    role.as_str(),
                    content,
                    created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_message: {e}")))?;

        // Read back the assigned order.
        let mut rows = self
            .conn()
            .query(
                "SELECT message_order FROM chat_messages WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_message readback: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("append_message readback: {e}")))?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "message".to_string(),
                id: id.to_string(),
            })?;
        let message_order: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::Query(format!("append_message readback: {e}")))?;

        debug!(session_id = %session_id, order = message_order, role = role.as_str(), "Message appended");

        Ok(SessionMessage {
            id,
            session_id,
            role,
            content: content.to_string(),
            message_order,
            created_at,
        })
    }

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<SessionMessage>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM chat_messages \
                     WHERE session_id = ?1 ORDER BY message_order ASC"
                ),
                params![session_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_messages: {e}")))?;

        let mut messages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_messages: {e}")))?
        {
            messages.push(row_to_message(&row)?);
        }
        Ok(messages)
    }

    // ── Profiles ────────────────────────────────────────────────────

    async fn create_profile(&self, record: &ProfileRecord) -> Result<(), DatabaseError> {
        let p = &record.profile;
        self.conn()
            .execute(
                "INSERT INTO business_profiles (id, session_id, business_name, industry, \
                 business_size, main_pain_points, time_wasters, bottlenecks, \
                 automation_opportunities, customer_service_challenges, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id.to_string(),
                    record.session_id.to_string(),
                    p.business_name.as_str(),
                    p.industry.as_str(),
                    opt_text(p.business_size.map(|s| s.as_str())),
                    list_to_json(&p.main_pain_points)?,
                    list_to_json(&p.time_wasters)?,
                    list_to_json(&p.bottlenecks)?,
                    list_to_json(&p.automation_opportunities)?,
                    list_to_json(&p.customer_service_challenges)?,
                    record.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_profile: {e}")))?;

        debug!(session_id = %record.session_id, "Business profile created");
        Ok(())
    }

    async fn get_profile_by_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<ProfileRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM business_profiles WHERE session_id = ?1"),
                params![session_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile_by_session: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile_by_session: {e}")))?
        {
            Some(row) => Ok(Some(row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    // ── Proposals ───────────────────────────────────────────────────

    async fn create_proposal(&self, proposal: &Proposal) -> Result<(), DatabaseError> {
        let c = &proposal.content;
        let agents = serde_json::to_string(&c.recommended_agents)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.conn()
            .execute(
                "INSERT INTO proposal_recommendations (id, session_id, business_profile_id, \
                 pricing_tier, recommended_agents, implementation_timeline, estimated_cost, \
                 key_benefits, technical_requirements, integration_points, proposal_summary, \
                 full_proposal_content, drive_file_id, pdf_generated, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    proposal.id.to_string(),
                    proposal.session_id.to_string(),
                    proposal.profile_id.to_string(),
                    c.pricing_tier.as_str(),
                    agents,
                    c.implementation_timeline.as_str(),
                    opt_text(c.estimated_cost.as_deref()),
                    list_to_json(&c.key_benefits)?,
                    list_to_json(&c.technical_requirements)?,
                    list_to_json(&c.integration_points)?,
                    c.proposal_summary.as_str(),
                    c.full_proposal_content.as_str(),
                    opt_text(proposal.drive_file_id.as_deref()),
                    proposal.pdf_generated as i64,
                    proposal.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_proposal: {e}")))?;

        debug!(session_id = %proposal.session_id, "Proposal created");
        Ok(())
    }

    async fn get_proposal_by_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<Proposal>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PROPOSAL_COLUMNS} FROM proposal_recommendations WHERE session_id = ?1"
                ),
                params![session_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_proposal_by_session: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_proposal_by_session: {e}")))?
        {
            Some(row) => Ok(Some(row_to_proposal(&row)?)),
            None => Ok(None),
        }
    }

    async fn set_proposal_artifacts(
        &self,
        id: Uuid,
        drive_file_id: Option<&str>,
        pdf_generated: bool,
    ) -> Result<(), DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE proposal_recommendations SET drive_file_id = ?1, pdf_generated = ?2 \
                 WHERE id = ?3",
                params![opt_text(drive_file_id), pdf_generated as i64, id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_proposal_artifacts: {e}")))?;

        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "proposal".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
