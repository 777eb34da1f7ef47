//! Driving port for deal reads.

use async_trait::async_trait;

use crate::domain::{DealId, DealView, Error, UserId};

/// Driving port for listing and fetching deals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DealQuery: Send + Sync {
    /// Deals the user is selling, with book and buyer expanded.
    async fn list_for_seller(&self, seller_id: UserId) -> Result<Vec<DealView>, Error>;

    /// Deals the user is buying, with book and seller expanded. Deals whose
    /// book was deleted are left out.
    async fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<DealView>, Error>;

    /// One deal, visible to its participants only.
    async fn get_deal(&self, deal_id: DealId, caller: UserId) -> Result<DealView, Error>;

    /// Number of completed sales for the seller.
    async fn sold_count(&self, seller_id: UserId) -> Result<u64, Error>;
}

/// Fixture query with no deals.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDealQuery;

#[async_trait]
impl DealQuery for FixtureDealQuery {
    async fn list_for_seller(&self, _seller_id: UserId) -> Result<Vec<DealView>, Error> {
        Ok(Vec::new())
    }

    async fn list_for_buyer(&self, _buyer_id: UserId) -> Result<Vec<DealView>, Error> {
        Ok(Vec::new())
    }

    async fn get_deal(&self, _deal_id: DealId, _caller: UserId) -> Result<DealView, Error> {
        Err(Error::not_found("deal not found"))
    }

    async fn sold_count(&self, _seller_id: UserId) -> Result<u64, Error> {
        Ok(0)
    }
}
