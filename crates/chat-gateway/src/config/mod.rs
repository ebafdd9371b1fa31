pub mod settings;

pub use settings::{
    DatabaseConfig, EventLogBackend, EventLogConfig, GatewayConfig, ServerConfig, SessionBinding,
    Settings,
};
