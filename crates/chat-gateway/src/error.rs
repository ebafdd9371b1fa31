//! Domain errors

use thiserror::Error;

/// Conversation store / identity registry failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store call timed out after {0}ms")]
    Timeout(u64),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

/// Event log publisher failures. Never fatal to a chat request.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to serialize chat log event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Broker error: {0}")]
    Broker(#[from] redis::RedisError),

    #[error("Publish timed out after {0}ms")]
    Timeout(u64),

    #[error("Event queue is full")]
    QueueFull,

    #[error("Event queue is closed")]
    QueueClosed,
}

/// Errors surfaced by the gateway orchestration.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Identity registry failure: {0}")]
    Identity(#[source] StoreError),

    #[error("Conversation store failure: {0}")]
    Storage(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),
}
