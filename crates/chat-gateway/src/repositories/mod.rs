//! Storage traits (ports)

pub mod conversation_store;
pub mod identity_registry;

pub use conversation_store::ConversationStore;
pub use identity_registry::IdentityRegistry;

#[cfg(test)]
pub use conversation_store::MockConversationStore;
#[cfg(test)]
pub use identity_registry::MockIdentityRegistry;
