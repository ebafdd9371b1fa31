pub mod event_log;
pub mod gateway;
pub mod reply;
pub mod session_manager;

pub use event_log::{ChatLogEvent, EventDispatcher, EventPublisher};
pub use gateway::Gateway;
pub use reply::{ReplyGenerator, StaticReplyGenerator};
pub use session_manager::SessionManager;
