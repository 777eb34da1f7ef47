//! Port for discarding a closed deal's chat thread.

use async_trait::async_trait;

use crate::domain::DealId;

use super::define_port_error;

define_port_error! {
    /// Errors raised while deleting chat history.
    pub enum ChatPurgerError {
        /// Chat storage connection could not be established.
        Connection { message: String } =>
            "chat store connection failed: {message}",
        /// Deletion failed during execution.
        Query { message: String } =>
            "chat purge failed: {message}",
    }
}

/// Deletes chat messages attached to a deal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPurger: Send + Sync {
    /// Remove every message in the deal's thread, returning how many went.
    async fn purge_deal_thread(&self, deal_id: &DealId) -> Result<u64, ChatPurgerError>;
}

/// Fixture purger with nothing to delete.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureChatPurger;

#[async_trait]
impl ChatPurger for FixtureChatPurger {
    async fn purge_deal_thread(&self, _deal_id: &DealId) -> Result<u64, ChatPurgerError> {
        Ok(0)
    }
}
