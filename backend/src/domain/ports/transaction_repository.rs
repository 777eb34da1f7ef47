//! Port for legacy single-book transaction persistence.

use async_trait::async_trait;

use crate::domain::{Transaction, TransactionId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by transaction repository adapters.
    pub enum TransactionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "transaction repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "transaction repository query failed: {message}",
    }
}

/// Port for transaction storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Persist a freshly opened transaction.
    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionRepositoryError>;

    /// Fetch a transaction by its own id.
    async fn find_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError>;

    /// Fetch the transaction opened for a gateway order.
    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Transaction>, TransactionRepositoryError>;

    /// Write the settled status and payment id, but only while the stored row
    /// is still pending. Returns `false` when another writer settled it first.
    async fn settle(&self, transaction: &Transaction) -> Result<bool, TransactionRepositoryError>;

    /// Write the courier booking, but only while no tracking id is stored.
    /// Returns `false` when another writer booked the shipment first.
    async fn record_shipment(
        &self,
        transaction: &Transaction,
    ) -> Result<bool, TransactionRepositoryError>;

    /// Overwrite the stored shipment status.
    async fn update_shipment_status(
        &self,
        transaction: &Transaction,
    ) -> Result<(), TransactionRepositoryError>;
}

/// Fixture repository with no stored transactions.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTransactionRepository;

#[async_trait]
impl TransactionRepository for FixtureTransactionRepository {
    async fn insert(&self, _transaction: &Transaction) -> Result<(), TransactionRepositoryError> {
        Ok(())
    }

    async fn find_by_id(
        &self,
        _id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        Ok(None)
    }

    async fn find_by_gateway_order_id(
        &self,
        _gateway_order_id: &str,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        Ok(None)
    }

    async fn settle(&self, _transaction: &Transaction) -> Result<bool, TransactionRepositoryError> {
        Ok(true)
    }

    async fn record_shipment(
        &self,
        _transaction: &Transaction,
    ) -> Result<bool, TransactionRepositoryError> {
        Ok(true)
    }

    async fn update_shipment_status(
        &self,
        _transaction: &Transaction,
    ) -> Result<(), TransactionRepositoryError> {
        Ok(())
    }
}
