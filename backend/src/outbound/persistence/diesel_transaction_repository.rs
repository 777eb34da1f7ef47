//! PostgreSQL-backed `TransactionRepository` for legacy single-book checkout.
//!
//! Settlement is a conditional update guarded on `payment_status = 'Pending'`,
//! so at most one of two racing verifications writes the terminal state.
//! Booking a shipment is guarded the same way on `tracking_id IS NULL`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TransactionRepository, TransactionRepositoryError};
use crate::domain::{
    BookId, Money, PaymentStatus, ShipmentStatus, ShippingDetails, Transaction, TransactionId,
    TransactionRecord, UserId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewTransactionRow, TransactionRow};
use super::pool::{DbPool, PoolError};
use super::schema::transactions;

/// Diesel-backed implementation of the `TransactionRepository` port.
#[derive(Clone)]
pub struct DieselTransactionRepository {
    pool: DbPool,
}

impl DieselTransactionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> TransactionRepositoryError {
    map_pool_error(error, TransactionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> TransactionRepositoryError {
    map_diesel_error(
        error,
        TransactionRepositoryError::query,
        TransactionRepositoryError::connection,
    )
}

fn row_to_transaction(row: TransactionRow) -> Result<Transaction, TransactionRepositoryError> {
    let payment_status = row
        .payment_status
        .parse::<PaymentStatus>()
        .map_err(|err| TransactionRepositoryError::query(err.to_string()))?;
    let shipment_status = row
        .shipment_status
        .parse::<ShipmentStatus>()
        .map_err(|err| TransactionRepositoryError::query(err.to_string()))?;
    let amount_paid = Money::from_minor(row.amount_minor)
        .ok_or_else(|| TransactionRepositoryError::query("negative amount paid"))?;

    Ok(Transaction::restore(TransactionRecord {
        id: TransactionId::from_uuid(row.id),
        buyer_id: UserId::from_uuid(row.buyer_id),
        seller_id: UserId::from_uuid(row.seller_id),
        book_id: BookId::from_uuid(row.book_id),
        amount_paid,
        payment_status,
        gateway_order_id: row.gateway_order_id,
        gateway_payment_id: row.gateway_payment_id,
        shipping_details: ShippingDetails {
            address: row.shipping_address,
            tracking_id: row.tracking_id,
            carrier: row.carrier,
            status: shipment_status,
        },
        created_at: row.created_at,
    }))
}

#[async_trait]
impl TransactionRepository for DieselTransactionRepository {
    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionRepositoryError> {
        let shipping = transaction.shipping_details();
        let row = NewTransactionRow {
            id: *transaction.id().as_uuid(),
            buyer_id: *transaction.buyer_id().as_uuid(),
            seller_id: *transaction.seller_id().as_uuid(),
            book_id: *transaction.book_id().as_uuid(),
            amount_minor: transaction.amount_paid().minor_units(),
            payment_status: transaction.payment_status().as_str(),
            gateway_order_id: transaction.gateway_order_id(),
            gateway_payment_id: transaction.gateway_payment_id(),
            shipping_address: shipping.address.as_deref(),
            tracking_id: shipping.tracking_id.as_deref(),
            carrier: shipping.carrier.as_deref(),
            shipment_status: shipping.status.as_str(),
            created_at: transaction.created_at(),
        };

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(transactions::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        transactions::table
            .find(id.as_uuid())
            .select(TransactionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(row_to_transaction)
            .transpose()
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        transactions::table
            .filter(transactions::gateway_order_id.eq(gateway_order_id))
            .select(TransactionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(row_to_transaction)
            .transpose()
    }

    async fn settle(&self, transaction: &Transaction) -> Result<bool, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            transactions::table
                .filter(transactions::id.eq(transaction.id().as_uuid()))
                .filter(transactions::payment_status.eq(PaymentStatus::Pending.as_str())),
        )
        .set((
            transactions::payment_status.eq(transaction.payment_status().as_str()),
            transactions::gateway_payment_id.eq(transaction.gateway_payment_id()),
        ))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(updated == 1)
    }

    async fn record_shipment(
        &self,
        transaction: &Transaction,
    ) -> Result<bool, TransactionRepositoryError> {
        let shipping = transaction.shipping_details();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            transactions::table
                .filter(transactions::id.eq(transaction.id().as_uuid()))
                .filter(transactions::tracking_id.is_null()),
        )
        .set((
            transactions::tracking_id.eq(shipping.tracking_id.as_deref()),
            transactions::carrier.eq(shipping.carrier.as_deref()),
            transactions::shipment_status.eq(shipping.status.as_str()),
        ))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(updated == 1)
    }

    async fn update_shipment_status(
        &self,
        transaction: &Transaction,
    ) -> Result<(), TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::update(transactions::table.find(transaction.id().as_uuid()))
            .set(transactions::shipment_status.eq(transaction.shipping_details().status.as_str()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::{fixture, rstest};
    use uuid::Uuid;

    #[fixture]
    fn row() -> TransactionRow {
        TransactionRow {
            id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            amount_minor: 29_900,
            payment_status: "Completed".to_owned(),
            gateway_order_id: "order_legacy".to_owned(),
            gateway_payment_id: Some("pay_1".to_owned()),
            shipping_address: Some("12 MG Road".to_owned()),
            tracking_id: None,
            carrier: None,
            shipment_status: "Processing".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn restores_settled_transaction(row: TransactionRow) {
        let transaction = row_to_transaction(row).expect("valid row");
        assert_eq!(transaction.payment_status(), PaymentStatus::Completed);
        assert_eq!(transaction.amount_paid(), Money::from_major(299));
        assert_eq!(
            transaction.shipping_details().address.as_deref(),
            Some("12 MG Road")
        );
    }

    #[rstest]
    fn unknown_shipment_status_is_a_query_error(mut row: TransactionRow) {
        row.shipment_status = "Teleported".to_owned();
        let error = row_to_transaction(row).expect_err("unknown status");
        assert!(matches!(error, TransactionRepositoryError::Query { .. }));
    }
}
