//! Port onto the shopping cart collaborator.
//!
//! Checkout reads a priced snapshot of the cart once and clears it after a
//! verified payment. The fulfillment core never edits individual cart lines.

use async_trait::async_trait;

use crate::domain::{BookListing, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cart adapters.
    pub enum CartStoreError {
        /// Cart storage connection could not be established.
        Connection { message: String } =>
            "cart store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "cart store query failed: {message}",
    }
}

/// Cart snapshot and reset.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Books currently in the user's cart with their live prices. Lines whose
    /// book no longer exists are omitted.
    async fn snapshot(&self, user_id: &UserId) -> Result<Vec<BookListing>, CartStoreError>;

    /// Empty the user's cart. Clearing an empty cart succeeds.
    async fn clear(&self, user_id: &UserId) -> Result<(), CartStoreError>;
}

/// Fixture cart that is always empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCartStore;

#[async_trait]
impl CartStore for FixtureCartStore {
    async fn snapshot(&self, _user_id: &UserId) -> Result<Vec<BookListing>, CartStoreError> {
        Ok(Vec::new())
    }

    async fn clear(&self, _user_id: &UserId) -> Result<(), CartStoreError> {
        Ok(())
    }
}
