//! Session and message data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an intake session.
///
/// `Active → Completed` on successful proposal generation;
/// `Active → Abandoned` by external action (timeout, explicit close).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "abandoned" => Self::Abandoned,
            _ => Self::Active,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Downstream side-effect flags recorded on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlag {
    ProposalGenerated,
    ProfileUploaded,
    BookingCompleted,
}

/// An intake session. Owned by the `SessionController`; mutated only
/// through explicit transition operations on the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub status: SessionStatus,
    pub business_name: Option<String>,
    pub industry: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub proposal_generated: bool,
    pub profile_uploaded: bool,
    pub booking_completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Active,
            business_name: None,
            industry: None,
            contact_email: None,
            contact_phone: None,
            proposal_generated: false,
            profile_uploaded: false,
            booking_completed: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Author of a dialogue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }
}

/// One immutable dialogue turn. `message_order` is unique and strictly
/// increasing per session, starting at 1 for the opening greeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub message_order: i64,
    pub created_at: DateTime<Utc>,
}
