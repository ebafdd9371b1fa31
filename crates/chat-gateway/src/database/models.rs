use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::StoreError;

/// Session lifecycle: `active --end--> ended`. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SessionStatus::Active),
            "ended" => Some(SessionStatus::Ended),
            _ => None,
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: Uuid,
    pub user_id: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
pub(crate) struct ChatSessionRow {
    pub session_id: Uuid,
    pub user_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl TryFrom<ChatSessionRow> for ChatSession {
    type Error = StoreError;

    fn try_from(row: ChatSessionRow) -> Result<Self, Self::Error> {
        let status = SessionStatus::from_str(&row.status).ok_or_else(|| {
            StoreError::CorruptRow(format!(
                "session {} has unknown status '{}'",
                row.session_id, row.status
            ))
        })?;

        Ok(ChatSession {
            session_id: row.session_id,
            user_id: row.user_id,
            status,
            created_at: row.created_at,
            ended_at: row.ended_at,
        })
    }
}

/// One immutable exchange. `timestamp` is assigned by the store.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub session_id: Uuid,
    pub user_id: String,
    pub message: String,
    pub bot_reply: String,
    pub timestamp: DateTime<Utc>,
}
