use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SessionBinding;
use crate::database::models::{ChatSession, Message};
use crate::error::{GatewayError, StoreError};
use crate::repositories::{ConversationStore, IdentityRegistry};
use crate::services::event_log::{ChatLogEvent, EventDispatcher};
use crate::services::reply::ReplyGenerator;
use crate::services::session_manager::SessionManager;

/// Orchestrates one request: identity upsert, reply generation, the
/// conversation write and, once that write committed, the audit event.
pub struct Gateway {
    identities: Arc<dyn IdentityRegistry>,
    store: Arc<dyn ConversationStore>,
    sessions: SessionManager,
    replies: Arc<dyn ReplyGenerator>,
    events: EventDispatcher,
    binding: SessionBinding,
    store_timeout: Duration,
}

impl Gateway {
    pub fn new(
        identities: Arc<dyn IdentityRegistry>,
        store: Arc<dyn ConversationStore>,
        replies: Arc<dyn ReplyGenerator>,
        events: EventDispatcher,
        binding: SessionBinding,
        store_timeout: Duration,
    ) -> Self {
        Self {
            identities,
            sessions: SessionManager::new(store.clone()),
            store,
            replies,
            events,
            binding,
            store_timeout,
        }
    }

    pub async fn send_message(
        &self,
        user_id: &str,
        platform: &str,
        message: &str,
    ) -> Result<Message, GatewayError> {
        require("user_id", user_id)?;
        require("platform", platform)?;
        require("message", message)?;

        info!(
            "Chat message: user={}, platform={}, message_len={}",
            user_id,
            platform,
            message.len()
        );

        // The conversation cannot be attributed without a user row.
        self.with_deadline(self.identities.upsert(user_id, platform))
            .await
            .map_err(GatewayError::Identity)?;

        let bot_reply = self.replies.generate(user_id, platform, message).await;

        let session_id = match self.binding {
            SessionBinding::Active => {
                self.with_deadline(self.sessions.resolve_or_start(user_id))
                    .await?
                    .session_id
            }
            SessionBinding::PerMessage => Uuid::new_v4(),
        };

        let saved = self
            .with_deadline(self.store.append_message(session_id, user_id, message, &bot_reply))
            .await?;

        // Committed; everything below is best-effort.
        if let Err(e) = self.events.enqueue(ChatLogEvent::from(&saved)) {
            warn!(
                user_id,
                session_id = %saved.session_id,
                error = %e,
                "Chat log event dropped"
            );
        }

        Ok(saved)
    }

    pub async fn conversation(&self, user_id: &str) -> Result<Vec<Message>, GatewayError> {
        require("user_id", user_id)?;
        Ok(self.with_deadline(self.store.get_conversation(user_id)).await?)
    }

    pub async fn start_session(
        &self,
        user_id: &str,
        platform: &str,
    ) -> Result<ChatSession, GatewayError> {
        require("user_id", user_id)?;
        require("platform", platform)?;

        self.with_deadline(self.identities.upsert(user_id, platform))
            .await
            .map_err(GatewayError::Identity)?;

        self.with_deadline(self.sessions.start(user_id)).await
    }

    pub async fn end_session(&self, session_id: Uuid, user_id: &str) -> Result<(), GatewayError> {
        require("user_id", user_id)?;
        self.with_deadline(self.sessions.end(session_id, user_id)).await
    }

    pub async fn active_session(&self, user_id: &str) -> Result<Option<ChatSession>, GatewayError> {
        require("user_id", user_id)?;
        self.with_deadline(self.sessions.active(user_id)).await
    }

    pub async fn ready(&self) -> Result<(), StoreError> {
        self.with_deadline(self.store.ping()).await
    }

    async fn with_deadline<T, E, F>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout.as_millis() as u64).into()),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), GatewayError> {
    if value.is_empty() {
        return Err(GatewayError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::DEFAULT_MOCK_REPLY;
    use crate::database::models::SessionStatus;
    use crate::error::PublishError;
    use crate::repositories::{MockConversationStore, MockIdentityRegistry};
    use crate::services::event_log::{DispatcherConfig, DispatcherHandle, MockEventPublisher};
    use crate::services::reply::StaticReplyGenerator;
    use chrono::Utc;

    fn stored(session_id: Uuid, user_id: &str, message: &str, bot_reply: &str) -> Message {
        Message {
            id: 1,
            session_id,
            user_id: user_id.to_string(),
            message: message.to_string(),
            bot_reply: bot_reply.to_string(),
            timestamp: Utc::now(),
        }
    }

    fn build_gateway(
        identities: MockIdentityRegistry,
        store: MockConversationStore,
        publisher: MockEventPublisher,
        binding: SessionBinding,
    ) -> (Gateway, DispatcherHandle) {
        let (events, handle) =
            EventDispatcher::spawn(Arc::new(publisher), DispatcherConfig::default());
        let gateway = Gateway::new(
            Arc::new(identities),
            Arc::new(store),
            Arc::new(StaticReplyGenerator::new(DEFAULT_MOCK_REPLY)),
            events,
            binding,
            Duration::from_secs(1),
        );
        (gateway, handle)
    }

    fn ok_identities() -> MockIdentityRegistry {
        let mut identities = MockIdentityRegistry::new();
        identities.expect_upsert().returning(|_, _| Ok(()));
        identities
    }

    #[tokio::test]
    async fn test_send_message_per_message_binding() {
        let mut store = MockConversationStore::new();
        store.expect_get_active_session().never();
        store
            .expect_append_message()
            .times(1)
            .returning(|session_id, user_id, message, bot_reply| {
                Ok(stored(session_id, user_id, message, bot_reply))
            });

        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .withf(|e| e.user_id == "u1" && e.message == "hi")
            .returning(|_| Ok(()));

        let (gateway, handle) =
            build_gateway(ok_identities(), store, publisher, SessionBinding::PerMessage);
        let saved = gateway.send_message("u1", "web", "hi").await.unwrap();

        assert_eq!(saved.bot_reply, DEFAULT_MOCK_REPLY);
        assert!(handle.drain(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_send_message_attaches_to_active_session() {
        let active = ChatSession {
            session_id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            status: SessionStatus::Active,
            created_at: Utc::now(),
            ended_at: None,
        };
        let expected = active.session_id;

        let mut store = MockConversationStore::new();
        store
            .expect_get_active_session()
            .returning(move |_| Ok(Some(active.clone())));
        store
            .expect_append_message()
            .withf(move |session_id, _, _, _| *session_id == expected)
            .returning(|session_id, user_id, message, bot_reply| {
                Ok(stored(session_id, user_id, message, bot_reply))
            });

        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().returning(|_| Ok(()));

        let (gateway, handle) =
            build_gateway(ok_identities(), store, publisher, SessionBinding::Active);
        let saved = gateway.send_message("u1", "web", "hi").await.unwrap();

        assert_eq!(saved.session_id, expected);
        assert!(handle.drain(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_identity_failure_aborts_before_write() {
        let mut identities = MockIdentityRegistry::new();
        identities
            .expect_upsert()
            .returning(|_, _| Err(StoreError::Timeout(1)));

        let mut store = MockConversationStore::new();
        store.expect_append_message().never();

        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().never();

        let (gateway, _handle) =
            build_gateway(identities, store, publisher, SessionBinding::PerMessage);
        assert!(matches!(
            gateway.send_message("u1", "web", "hi").await,
            Err(GatewayError::Identity(_))
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_emits_no_event() {
        let mut store = MockConversationStore::new();
        store
            .expect_append_message()
            .returning(|_, _, _, _| Err(StoreError::CorruptRow("boom".to_string())));

        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().never();

        let (gateway, _handle) =
            build_gateway(ok_identities(), store, publisher, SessionBinding::PerMessage);
        assert!(matches!(
            gateway.send_message("u1", "web", "hi").await,
            Err(GatewayError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_request() {
        let mut store = MockConversationStore::new();
        store
            .expect_append_message()
            .returning(|session_id, user_id, message, bot_reply| {
                Ok(stored(session_id, user_id, message, bot_reply))
            });

        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .returning(|_| Err(PublishError::Timeout(10)));

        let (gateway, handle) =
            build_gateway(ok_identities(), store, publisher, SessionBinding::PerMessage);
        let saved = gateway.send_message("u1", "web", "hi").await.unwrap();

        assert_eq!(saved.message, "hi");
        assert!(handle.drain(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_empty_message_is_validation_error() {
        let mut identities = MockIdentityRegistry::new();
        identities.expect_upsert().never();

        let (gateway, _handle) = build_gateway(
            identities,
            MockConversationStore::new(),
            MockEventPublisher::new(),
            SessionBinding::Active,
        );

        assert!(matches!(
            gateway.send_message("u1", "web", "").await,
            Err(GatewayError::Validation(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out_as_storage_error() {
        struct Stalled;
        #[async_trait::async_trait]
        impl ConversationStore for Stalled {
            async fn append_message(
                &self,
                _: Uuid,
                _: &str,
                _: &str,
                _: &str,
            ) -> Result<Message, StoreError> {
                std::future::pending().await
            }
            async fn get_conversation(&self, _: &str) -> Result<Vec<Message>, StoreError> {
                std::future::pending().await
            }
            async fn create_session(
                &self,
                _: Uuid,
                _: &str,
                _: SessionStatus,
            ) -> Result<ChatSession, StoreError> {
                std::future::pending().await
            }
            async fn end_session(&self, _: Uuid, _: &str) -> Result<u64, StoreError> {
                std::future::pending().await
            }
            async fn get_active_session(
                &self,
                _: &str,
            ) -> Result<Option<ChatSession>, StoreError> {
                std::future::pending().await
            }
            async fn ping(&self) -> Result<(), StoreError> {
                std::future::pending().await
            }
        }

        let (events, _handle) =
            EventDispatcher::spawn(Arc::new(MockEventPublisher::new()), DispatcherConfig::default());
        let gateway = Gateway::new(
            Arc::new(ok_identities()),
            Arc::new(Stalled),
            Arc::new(StaticReplyGenerator::new("ok")),
            events,
            SessionBinding::PerMessage,
            Duration::from_millis(50),
        );

        assert!(matches!(
            gateway.conversation("u1").await,
            Err(GatewayError::Storage(StoreError::Timeout(50)))
        ));
        assert!(matches!(gateway.ready().await, Err(StoreError::Timeout(50))));
    }
}
