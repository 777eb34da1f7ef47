//! Port for order persistence.
//!
//! Every write after the initial insert is a compare-and-swap on the order's
//! revision. Callers bump the revision on the aggregate, then pass the value
//! the store must still hold; a stale writer receives
//! [`OrderRepositoryError::RevisionMismatch`] and nothing is written.

use async_trait::async_trait;

use crate::domain::{Order, OrderId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "order repository query failed: {message}",
        /// Optimistic concurrency check failed.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
    }
}

/// Port for order storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a freshly placed order.
    async fn insert(&self, order: &Order) -> Result<(), OrderRepositoryError>;

    /// Fetch an order by identifier.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderRepositoryError>;

    /// Fetch the order opened for a gateway order.
    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, OrderRepositoryError>;

    /// Orders placed by `buyer_id`, newest first.
    async fn list_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>, OrderRepositoryError>;

    /// Overwrite `order` if the stored revision still equals
    /// `expected_revision`.
    async fn save(&self, order: &Order, expected_revision: u32) -> Result<(), OrderRepositoryError>;
}

/// Fixture repository with no stored orders.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderRepository;

#[async_trait]
impl OrderRepository for FixtureOrderRepository {
    async fn insert(&self, _order: &Order) -> Result<(), OrderRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(None)
    }

    async fn find_by_gateway_order_id(
        &self,
        _gateway_order_id: &str,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(None)
    }

    async fn list_for_buyer(&self, _buyer_id: &UserId) -> Result<Vec<Order>, OrderRepositoryError> {
        Ok(Vec::new())
    }

    async fn save(&self, _order: &Order, _expected_revision: u32) -> Result<(), OrderRepositoryError> {
        Ok(())
    }
}
