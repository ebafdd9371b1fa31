//! Shared fixtures: in-memory stores, recording publishers and an app builder.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use chat_gateway::config::settings::DEFAULT_MOCK_REPLY;
use chat_gateway::config::SessionBinding;
use chat_gateway::database::models::{ChatSession, Message, SessionStatus, User};
use chat_gateway::error::{PublishError, StoreError};
use chat_gateway::repositories::{ConversationStore, IdentityRegistry};
use chat_gateway::router::build_router;
use chat_gateway::services::event_log::{DispatcherConfig, DispatcherHandle, EventDispatcher};
use chat_gateway::services::{ChatLogEvent, EventPublisher, Gateway, StaticReplyGenerator};
use chat_gateway::state::AppState;

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    sessions: Vec<ChatSession>,
    messages: Vec<Message>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Mutex-backed stand-in for PostgreSQL with the same observable semantics.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    healthy: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            healthy: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn user(&self, user_id: &str) -> Option<User> {
        self.tables.lock().unwrap().users.get(user_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub fn message_count(&self) -> usize {
        self.tables.lock().unwrap().messages.len()
    }

    pub fn session(&self, session_id: Uuid) -> Option<ChatSession> {
        self.tables
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::CorruptRow("store offline".to_string()))
        }
    }
}

impl Tables {
    // Strictly increasing, like a single-writer clock.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + ChronoDuration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

#[async_trait]
impl IdentityRegistry for MemoryStore {
    async fn upsert(&self, user_id: &str, platform: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let created_at = tables.next_timestamp();
        tables.users.entry(user_id.to_string()).or_insert(User {
            user_id: user_id.to_string(),
            platform: platform.to_string(),
            created_at,
        });
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn append_message(
        &self,
        session_id: Uuid,
        user_id: &str,
        message: &str,
        bot_reply: &str,
    ) -> Result<Message, StoreError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let saved = Message {
            id: tables.messages.len() as i64 + 1,
            session_id,
            user_id: user_id.to_string(),
            message: message.to_string(),
            bot_reply: bot_reply.to_string(),
            timestamp: tables.next_timestamp(),
        };
        tables.messages.push(saved.clone());
        Ok(saved)
    }

    async fn get_conversation(&self, user_id: &str) -> Result<Vec<Message>, StoreError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn create_session(
        &self,
        session_id: Uuid,
        user_id: &str,
        status: SessionStatus,
    ) -> Result<ChatSession, StoreError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let session = ChatSession {
            session_id,
            user_id: user_id.to_string(),
            status,
            created_at: tables.next_timestamp(),
            ended_at: None,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn end_session(&self, session_id: Uuid, user_id: &str) -> Result<u64, StoreError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let ended_at = tables.next_timestamp();
        let mut affected = 0;
        for session in tables
            .sessions
            .iter_mut()
            .filter(|s| s.session_id == session_id && s.user_id == user_id)
        {
            session.status = SessionStatus::Ended;
            session.ended_at = Some(ended_at);
            affected += 1;
        }
        Ok(affected)
    }

    async fn get_active_session(&self, user_id: &str) -> Result<Option<ChatSession>, StoreError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active())
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

// ============================================================================
// Publishers
// ============================================================================

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ChatLogEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<ChatLogEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &ChatLogEvent) -> Result<(), PublishError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Broker that is always down.
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: &ChatLogEvent) -> Result<(), PublishError> {
        Err(PublishError::Timeout(1))
    }
}

// ============================================================================
// App builders
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<Gateway>,
    pub store: Arc<MemoryStore>,
    pub dispatcher: DispatcherHandle,
}

impl TestApp {
    /// Wait for queued events to be attempted.
    pub async fn drain(&self) {
        assert!(self.dispatcher.drain(Duration::from_secs(2)).await);
    }
}

pub fn test_app_with(publisher: Arc<dyn EventPublisher>, binding: SessionBinding) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let (events, dispatcher) = EventDispatcher::spawn(publisher, DispatcherConfig::default());

    let gateway = Arc::new(Gateway::new(
        store.clone(),
        store.clone(),
        Arc::new(StaticReplyGenerator::new(DEFAULT_MOCK_REPLY)),
        events,
        binding,
        Duration::from_secs(2),
    ));

    TestApp {
        router: build_router(AppState::new(gateway.clone()), 30),
        gateway,
        store,
        dispatcher,
    }
}

pub fn test_app() -> (TestApp, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::default());
    let app = test_app_with(publisher.clone(), SessionBinding::Active);
    (app, publisher)
}
