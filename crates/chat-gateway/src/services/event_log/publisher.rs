use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use super::ChatLogEvent;
use crate::config::EventLogConfig;
use crate::error::PublishError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Append one event and wait for the broker acknowledgement.
    async fn publish(&self, event: &ChatLogEvent) -> Result<(), PublishError>;
}

/// Appends events to a Redis Stream (`XADD`). The broker-assigned entry id
/// is the event's position in the log.
#[derive(Clone)]
pub struct RedisStreamPublisher {
    conn: ConnectionManager,
    stream: String,
    max_len: Option<usize>,
}

impl RedisStreamPublisher {
    pub async fn connect(config: &EventLogConfig) -> Result<Self, PublishError> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        info!("Event log connected, stream={}", config.stream);

        Ok(Self {
            conn,
            stream: config.stream.clone(),
            max_len: config.max_len,
        })
    }
}

fn xadd(stream: &str, max_len: Option<usize>, payload: &str) -> redis::Cmd {
    let mut cmd = redis::cmd("XADD");
    cmd.arg(stream);
    if let Some(max_len) = max_len {
        cmd.arg("MAXLEN").arg("~").arg(max_len);
    }
    cmd.arg("*").arg("event").arg(payload);
    cmd
}

#[async_trait]
impl EventPublisher for RedisStreamPublisher {
    async fn publish(&self, event: &ChatLogEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;

        let mut conn = self.conn.clone();
        let entry_id: String = xadd(&self.stream, self.max_len, &payload)
            .query_async(&mut conn)
            .await?;

        debug!(
            stream = %self.stream,
            entry_id = %entry_id,
            session_id = %event.session_id,
            "Chat log appended"
        );

        Ok(())
    }
}

/// Used when `event_log.backend = "disabled"`.
pub struct DisabledPublisher;

#[async_trait]
impl EventPublisher for DisabledPublisher {
    async fn publish(&self, event: &ChatLogEvent) -> Result<(), PublishError> {
        debug!(session_id = %event.session_id, "Event log disabled, dropping chat log");
        Ok(())
    }
}
