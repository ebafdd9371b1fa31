use super::models::{ChatSession, ChatSessionRow, Message, SessionStatus};
use super::DbPool;
use crate::error::StoreError;
use crate::repositories::{ConversationStore, IdentityRegistry};
use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

/// PostgreSQL implementation of the identity registry and conversation store.
/// Every operation is a single auto-committed statement.
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRegistry for Repository {
    async fn upsert(&self, user_id: &str, platform: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"INSERT INTO users (user_id, platform)
               VALUES ($1, $2)
               ON CONFLICT (user_id) DO NOTHING"#,
        )
        .bind(user_id)
        .bind(platform)
        .execute(self.pool.get_pool())
        .await
        .map_err(|e| {
            error!("Database error upserting user {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        if result.rows_affected() > 0 {
            debug!(user_id, platform, "Registered new user");
        }

        Ok(())
    }
}

#[async_trait]
impl ConversationStore for Repository {
    async fn append_message(
        &self,
        session_id: Uuid,
        user_id: &str,
        message: &str,
        bot_reply: &str,
    ) -> Result<Message, StoreError> {
        let saved = sqlx::query_as::<_, Message>(
            r#"INSERT INTO messages (session_id, user_id, message, bot_reply)
               VALUES ($1, $2, $3, $4)
               RETURNING id, session_id, user_id, message, bot_reply, timestamp"#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(message)
        .bind(bot_reply)
        .fetch_one(self.pool.get_pool())
        .await
        .map_err(|e| {
            error!("Database error saving message for user {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        debug!(
            message_id = saved.id,
            %session_id,
            user_id,
            "Message saved"
        );

        Ok(saved)
    }

    async fn get_conversation(&self, user_id: &str) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"SELECT id, session_id, user_id, message, bot_reply, timestamp
               FROM messages
               WHERE user_id = $1
               ORDER BY timestamp ASC, id ASC"#,
        )
        .bind(user_id)
        .fetch_all(self.pool.get_pool())
        .await
        .map_err(|e| {
            error!("Database error loading conversation for user {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        debug!("Loaded {} messages for user {}", messages.len(), user_id);

        Ok(messages)
    }

    async fn create_session(
        &self,
        session_id: Uuid,
        user_id: &str,
        status: SessionStatus,
    ) -> Result<ChatSession, StoreError> {
        let row = sqlx::query_as::<_, ChatSessionRow>(
            r#"INSERT INTO chat_sessions (session_id, user_id, status)
               VALUES ($1, $2, $3)
               RETURNING session_id, user_id, status, created_at, ended_at"#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(status.as_str())
        .fetch_one(self.pool.get_pool())
        .await
        .map_err(|e| {
            error!("Database error creating session for user {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        row.try_into()
    }

    async fn end_session(&self, session_id: Uuid, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"UPDATE chat_sessions
               SET status = 'ended', ended_at = now()
               WHERE session_id = $1 AND user_id = $2"#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(self.pool.get_pool())
        .await
        .map_err(|e| {
            error!("Database error ending session {}: {}", session_id, e);
            StoreError::from(e)
        })?;

        Ok(result.rows_affected())
    }

    async fn get_active_session(&self, user_id: &str) -> Result<Option<ChatSession>, StoreError> {
        let row = sqlx::query_as::<_, ChatSessionRow>(
            r#"SELECT session_id, user_id, status, created_at, ended_at
               FROM chat_sessions
               WHERE user_id = $1 AND status = 'active'
               ORDER BY created_at DESC
               LIMIT 1"#,
        )
        .bind(user_id)
        .fetch_optional(self.pool.get_pool())
        .await
        .map_err(|e| {
            error!("Database error finding active session for user {}: {}", user_id, e);
            StoreError::from(e)
        })?;

        row.map(ChatSession::try_from).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }
}
