//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! Line items, the shipping address, tracking and notification preferences
//! are stored as JSONB documents. Updates are compare-and-swap on the
//! `revision` column so concurrent writers cannot silently overwrite each
//! other.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{Money, Order, OrderId, OrderRecord, OrderStatus, PaymentMethod, UserId};

use super::diesel_error_mapping::{
    map_diesel_error, map_pool_error, revision_from_db, revision_to_db,
};
use super::models::{NewOrderRow, OrderRow, OrderUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::orders;

/// Diesel-backed implementation of the `OrderRepository` port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> OrderRepositoryError {
    map_pool_error(error, OrderRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> OrderRepositoryError {
    map_diesel_error(
        error,
        OrderRepositoryError::query,
        OrderRepositoryError::connection,
    )
}

fn encode<T: Serialize + ?Sized>(
    value: &T,
    column: &str,
) -> Result<serde_json::Value, OrderRepositoryError> {
    serde_json::to_value(value)
        .map_err(|err| OrderRepositoryError::query(format!("encode {column}: {err}")))
}

fn decode<T: DeserializeOwned>(
    value: serde_json::Value,
    column: &str,
) -> Result<T, OrderRepositoryError> {
    serde_json::from_value(value)
        .map_err(|err| OrderRepositoryError::query(format!("decode {column}: {err}")))
}

fn row_to_order(row: OrderRow) -> Result<Order, OrderRepositoryError> {
    let status = row
        .status
        .parse::<OrderStatus>()
        .map_err(|err| OrderRepositoryError::query(err.to_string()))?;
    let payment_method = row
        .payment_method
        .parse::<PaymentMethod>()
        .map_err(|err| OrderRepositoryError::query(err.to_string()))?;
    let total_amount = Money::from_minor(row.total_minor)
        .ok_or_else(|| OrderRepositoryError::query("negative order total"))?;

    Ok(Order::restore(OrderRecord {
        id: OrderId::from_uuid(row.id),
        buyer_id: UserId::from_uuid(row.buyer_id),
        items: decode(row.items, "items")?,
        total_amount,
        status,
        shipping_address: decode(row.shipping_address, "shipping_address")?,
        gateway_order_id: row.gateway_order_id,
        gateway_payment_id: row.gateway_payment_id,
        payment_method,
        tracking: row.tracking.map(|value| decode(value, "tracking")).transpose()?,
        notification_preferences: decode(
            row.notification_preferences,
            "notification_preferences",
        )?,
        revision: revision_from_db(row.revision),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

async fn current_revision<C>(
    conn: &mut C,
    id: uuid::Uuid,
) -> Result<Option<i32>, OrderRepositoryError>
where
    C: diesel_async::AsyncConnection<Backend = diesel::pg::Pg> + Send,
{
    orders::table
        .find(id)
        .select(orders::revision)
        .first(conn)
        .await
        .optional()
        .map_err(diesel_error)
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        let items = encode(order.items(), "items")?;
        let shipping_address = encode(order.shipping_address(), "shipping_address")?;
        let tracking = order
            .tracking()
            .map(|tracking| encode(tracking, "tracking"))
            .transpose()?;
        let preferences = encode(&order.notification_preferences(), "notification_preferences")?;

        let row = NewOrderRow {
            id: *order.id().as_uuid(),
            buyer_id: *order.buyer_id().as_uuid(),
            items: &items,
            total_minor: order.total_amount().minor_units(),
            status: order.status().as_str(),
            shipping_address: &shipping_address,
            gateway_order_id: order.gateway_order_id(),
            gateway_payment_id: order.gateway_payment_id(),
            payment_method: order.payment_method().as_str(),
            tracking: tracking.as_ref(),
            notification_preferences: &preferences,
            revision: revision_to_db(order.revision()),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        };

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(orders::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        orders::table
            .find(id.as_uuid())
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(row_to_order)
            .transpose()
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        orders::table
            .filter(orders::gateway_order_id.eq(gateway_order_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(row_to_order)
            .transpose()
    }

    async fn list_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        orders::table
            .filter(orders::buyer_id.eq(buyer_id.as_uuid()))
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?
            .into_iter()
            .map(row_to_order)
            .collect()
    }

    async fn save(
        &self,
        order: &Order,
        expected_revision: u32,
    ) -> Result<(), OrderRepositoryError> {
        let tracking = order
            .tracking()
            .map(|tracking| encode(tracking, "tracking"))
            .transpose()?;
        let preferences = encode(&order.notification_preferences(), "notification_preferences")?;
        let update = OrderUpdate {
            status: order.status().as_str(),
            gateway_payment_id: order.gateway_payment_id(),
            tracking: tracking.as_ref(),
            notification_preferences: &preferences,
            revision: revision_to_db(order.revision()),
            updated_at: order.updated_at(),
        };

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let id = *order.id().as_uuid();
        let updated = diesel::update(
            orders::table
                .filter(orders::id.eq(id))
                .filter(orders::revision.eq(revision_to_db(expected_revision))),
        )
        .set(&update)
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;

        if updated == 1 {
            return Ok(());
        }
        match current_revision(&mut conn, id).await? {
            Some(actual) => Err(OrderRepositoryError::revision_mismatch(
                expected_revision,
                revision_from_db(actual),
            )),
            None => Err(OrderRepositoryError::query("order not found for update")),
        }
    }
}
