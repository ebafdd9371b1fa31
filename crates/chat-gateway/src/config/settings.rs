use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

pub const DEFAULT_MOCK_REPLY: &str =
    "This is a mock response. In production, this would be processed by an NLP engine.";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub event_log: EventLogConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// Full connection string; wins over the discrete fields when set.
    #[serde(default)]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    pub name: String,
    pub pool_max_size: u32,
    pub pool_timeout_seconds: u64,
    pub statement_timeout_ms: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventLogBackend {
    Redis,
    Disabled,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EventLogConfig {
    pub backend: EventLogBackend,
    pub url: String,
    pub stream: String,
    /// Approximate cap passed as `MAXLEN ~`; unbounded when absent.
    #[serde(default)]
    pub max_len: Option<usize>,
    pub publish_timeout_ms: u64,
    pub queue_capacity: usize,
    pub worker_count: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionBinding {
    /// Attach messages to the user's active session, creating one if needed.
    Active,
    /// Fresh session id per message, no session row.
    PerMessage,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
    pub session_binding: SessionBinding,
    pub mock_reply: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            session_binding: SessionBinding::Active,
            mock_reply: DEFAULT_MOCK_REPLY.to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.parse()?);
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.name);
        if let Some(password) = self.password.as_deref() {
            options = options.password(password);
        }
        Ok(options)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

impl EventLogConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            .add_source(File::with_name("config/settings").required(false))
            // Example: APP_EVENT_LOG__STREAM=chat-logs
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Flat deployment variables
            .set_override_option("database.url", env_var("DATABASE_URL"))?
            .set_override_option("database.host", env_var("DB_HOST"))?
            .set_override_option("database.port", env_var("DB_PORT"))?
            .set_override_option("database.user", env_var("DB_USER"))?
            .set_override_option("database.password", env_var("DB_PASSWORD"))?
            .set_override_option("database.name", env_var("DB_NAME"))?
            .set_override_option("event_log.url", env_var("EVENT_LOG_URL"))?
            .set_override_option("event_log.stream", env_var("EVENT_LOG_STREAM"))?
            .set_override_option("server.port", env_var("PORT"))?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.request_timeout_seconds", 30)?
            .set_default("server.shutdown_grace_seconds", 5)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.user", "postgres")?
            .set_default("database.name", "chatbot")?
            .set_default("database.pool_max_size", 10)?
            .set_default("database.pool_timeout_seconds", 5)?
            .set_default("database.statement_timeout_ms", 5000)?
            .set_default("database.run_migrations", true)?
            .set_default("event_log.backend", "redis")?
            .set_default("event_log.url", "redis://127.0.0.1:6379")?
            .set_default("event_log.stream", "chat-logs")?
            .set_default("event_log.publish_timeout_ms", 3000)?
            .set_default("event_log.queue_capacity", 10_000)?
            .set_default("event_log.worker_count", 2)?
            .set_default("gateway.session_binding", "active")?
            .set_default("gateway.mock_reply", DEFAULT_MOCK_REPLY)?)
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.database.pool_max_size == 0 {
            anyhow::bail!("database.pool_max_size must be at least 1");
        }
        if self.event_log.queue_capacity == 0 || self.event_log.worker_count == 0 {
            anyhow::bail!("event_log.queue_capacity and event_log.worker_count must be at least 1");
        }
        if self.event_log.backend == EventLogBackend::Redis && self.event_log.stream.trim().is_empty() {
            anyhow::bail!("event_log.stream must not be empty");
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
