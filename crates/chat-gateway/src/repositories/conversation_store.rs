//! Conversation store trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{ChatSession, Message, SessionStatus};
use crate::error::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert one immutable message. The timestamp is assigned by the store.
    async fn append_message(
        &self,
        session_id: Uuid,
        user_id: &str,
        message: &str,
        bot_reply: &str,
    ) -> Result<Message, StoreError>;

    /// All messages of a user, ascending by timestamp. Empty when unknown.
    async fn get_conversation(&self, user_id: &str) -> Result<Vec<Message>, StoreError>;

    async fn create_session(
        &self,
        session_id: Uuid,
        user_id: &str,
        status: SessionStatus,
    ) -> Result<ChatSession, StoreError>;

    /// Unconditionally marks the session ended and refreshes `ended_at`.
    /// Returns the number of rows matched by `(session_id, user_id)`.
    async fn end_session(&self, session_id: Uuid, user_id: &str) -> Result<u64, StoreError>;

    /// Most recently created active session of the user.
    async fn get_active_session(&self, user_id: &str) -> Result<Option<ChatSession>, StoreError>;

    /// Connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
