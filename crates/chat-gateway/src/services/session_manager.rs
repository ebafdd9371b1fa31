use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::models::{ChatSession, SessionStatus};
use crate::error::GatewayError;
use crate::repositories::ConversationStore;

/// Owns session state transitions: `active --end--> ended`.
pub struct SessionManager {
    store: Arc<dyn ConversationStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Always creates a brand-new active session, even if the user already
    /// has one.
    pub async fn start(&self, user_id: &str) -> Result<ChatSession, GatewayError> {
        let session = self
            .store
            .create_session(Uuid::new_v4(), user_id, SessionStatus::Active)
            .await?;

        info!(user_id, session_id = %session.session_id, "Session started");
        Ok(session)
    }

    /// Ends a session owned by `user_id`. Ending twice is harmless; an
    /// unknown `(session_id, user_id)` pair is `NotFound`.
    pub async fn end(&self, session_id: Uuid, user_id: &str) -> Result<(), GatewayError> {
        let affected = self.store.end_session(session_id, user_id).await?;

        if affected == 0 {
            debug!(user_id, %session_id, "End requested for unknown session");
            return Err(GatewayError::NotFound(format!("session {}", session_id)));
        }

        info!(user_id, %session_id, "Session ended");
        Ok(())
    }

    pub async fn active(&self, user_id: &str) -> Result<Option<ChatSession>, GatewayError> {
        Ok(self.store.get_active_session(user_id).await?)
    }

    /// Active session of the user, started on demand.
    pub async fn resolve_or_start(&self, user_id: &str) -> Result<ChatSession, GatewayError> {
        match self.active(user_id).await? {
            Some(session) => Ok(session),
            None => self.start(user_id).await,
        }
    }
}
