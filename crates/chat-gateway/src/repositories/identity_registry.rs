//! Identity registry trait (port)

use async_trait::async_trait;

use crate::error::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityRegistry: Send + Sync {
    /// Insert-or-ignore. A known `user_id` is a silent no-op and its
    /// `platform` is never overwritten.
    async fn upsert(&self, user_id: &str, platform: &str) -> Result<(), StoreError>;
}
