//! Driving port for order reads.

use async_trait::async_trait;

use crate::domain::{Error, Order, OrderId, UserId};

/// Driving port for listing and fetching the caller's orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderQuery: Send + Sync {
    /// Orders placed by the buyer, newest first.
    async fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, Error>;

    /// One order. Orders of other buyers are reported as missing.
    async fn get_order(&self, order_id: OrderId, buyer_id: UserId) -> Result<Order, Error>;
}

/// Fixture query with no orders.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderQuery;

#[async_trait]
impl OrderQuery for FixtureOrderQuery {
    async fn list_for_buyer(&self, _buyer_id: UserId) -> Result<Vec<Order>, Error> {
        Ok(Vec::new())
    }

    async fn get_order(&self, _order_id: OrderId, _buyer_id: UserId) -> Result<Order, Error> {
        Err(Error::not_found("order not found"))
    }
}
