//! Port for deal persistence.
//!
//! The store enforces one deal per `(book, buyer)` pair. Inserts that hit the
//! pair constraint hand back the stored deal instead of failing, which is what
//! makes deal creation idempotent under concurrent requests.

use async_trait::async_trait;

use crate::domain::{BookId, Deal, DealId, DealStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by deal repository adapters.
    pub enum DealRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "deal repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "deal repository query failed: {message}",
    }
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealInsertOutcome {
    /// The deal was written.
    Created(Deal),
    /// A deal for the same book and buyer already existed and is returned
    /// unchanged.
    Existing(Deal),
}

/// Port for deal storage and retrieval.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DealRepository: Send + Sync {
    /// Fetch a deal by identifier.
    async fn find_by_id(&self, id: &DealId) -> Result<Option<Deal>, DealRepositoryError>;

    /// Fetch the deal a buyer opened for a book, if any.
    async fn find_by_book_and_buyer(
        &self,
        book_id: &BookId,
        buyer_id: &UserId,
    ) -> Result<Option<Deal>, DealRepositoryError>;

    /// Insert `deal` unless one already exists for its book and buyer.
    async fn insert_if_absent(&self, deal: &Deal) -> Result<DealInsertOutcome, DealRepositoryError>;

    /// Overwrite the mutable fields (status, rating, `updated_at`).
    async fn save(&self, deal: &Deal) -> Result<(), DealRepositoryError>;

    /// Deals where `seller_id` is the seller, newest first.
    async fn list_for_seller(&self, seller_id: &UserId) -> Result<Vec<Deal>, DealRepositoryError>;

    /// Deals where `buyer_id` is the buyer, newest first.
    async fn list_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Deal>, DealRepositoryError>;

    /// Number of deals sold by `seller_id` that are in `status`.
    async fn count_for_seller(
        &self,
        seller_id: &UserId,
        status: DealStatus,
    ) -> Result<u64, DealRepositoryError>;
}

/// Fixture repository with no stored deals. Inserts always report creation.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDealRepository;

#[async_trait]
impl DealRepository for FixtureDealRepository {
    async fn find_by_id(&self, _id: &DealId) -> Result<Option<Deal>, DealRepositoryError> {
        Ok(None)
    }

    async fn find_by_book_and_buyer(
        &self,
        _book_id: &BookId,
        _buyer_id: &UserId,
    ) -> Result<Option<Deal>, DealRepositoryError> {
        Ok(None)
    }

    async fn insert_if_absent(&self, deal: &Deal) -> Result<DealInsertOutcome, DealRepositoryError> {
        Ok(DealInsertOutcome::Created(deal.clone()))
    }

    async fn save(&self, _deal: &Deal) -> Result<(), DealRepositoryError> {
        Ok(())
    }

    async fn list_for_seller(&self, _seller_id: &UserId) -> Result<Vec<Deal>, DealRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_for_buyer(&self, _buyer_id: &UserId) -> Result<Vec<Deal>, DealRepositoryError> {
        Ok(Vec::new())
    }

    async fn count_for_seller(
        &self,
        _seller_id: &UserId,
        _status: DealStatus,
    ) -> Result<u64, DealRepositoryError> {
        Ok(0)
    }
}
