//! Best-effort audit stream of every chat exchange
//!
//! The conversation store is the durability boundary. Events are queued
//! after a successful write and published by background workers; a
//! publish failure is logged and never reaches the HTTP response.

mod dispatcher;
mod publisher;

pub use dispatcher::{DispatcherConfig, DispatcherHandle, EventDispatcher};
pub use publisher::{DisabledPublisher, EventPublisher, RedisStreamPublisher};

#[cfg(test)]
pub use publisher::MockEventPublisher;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::Message;

/// Flattened snapshot of one stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEvent {
    pub user_id: String,
    pub session_id: String,
    pub message: String,
    pub bot_reply: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for ChatLogEvent {
    fn from(message: &Message) -> Self {
        Self {
            user_id: message.user_id.clone(),
            session_id: message.session_id.to_string(),
            message: message.message.clone(),
            bot_reply: message.bot_reply.clone(),
            timestamp: message.timestamp,
        }
    }
}
