//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions to domain types live next to
//! the repository that reads them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{addresses, books, deals, orders, transactions, users};

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Row struct for reading from the books table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub price_minor: i64,
    pub seller_id: Uuid,
}

/// Row struct for reading from the addresses table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AddressRow {
    pub full_name: String,
    pub phone_number: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

// ---------------------------------------------------------------------------
// Deal models
// ---------------------------------------------------------------------------

/// Row struct for reading from the deals table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = deals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DealRow {
    pub id: Uuid,
    pub book_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub status: String,
    pub method: String,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub rating_stars: Option<i16>,
    pub rating_comment: Option<String>,
    pub rated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new deal records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = deals)]
pub(crate) struct NewDealRow<'a> {
    pub id: Uuid,
    pub book_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub status: &'a str,
    pub method: &'a str,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for the mutable deal columns. A missing rating clears the
/// rating columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = deals)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DealUpdate<'a> {
    pub status: &'a str,
    pub rating_stars: Option<i16>,
    pub rating_comment: Option<&'a str>,
    pub rated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Order models
// ---------------------------------------------------------------------------

/// Row struct for reading from the orders table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub items: serde_json::Value,
    pub total_minor: i64,
    pub status: String,
    pub shipping_address: serde_json::Value,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub payment_method: String,
    pub tracking: Option<serde_json::Value>,
    pub notification_preferences: serde_json::Value,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new order records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub(crate) struct NewOrderRow<'a> {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub items: &'a serde_json::Value,
    pub total_minor: i64,
    pub status: &'a str,
    pub shipping_address: &'a serde_json::Value,
    pub gateway_order_id: &'a str,
    pub gateway_payment_id: Option<&'a str>,
    pub payment_method: &'a str,
    pub tracking: Option<&'a serde_json::Value>,
    pub notification_preferences: &'a serde_json::Value,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for the mutable order columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct OrderUpdate<'a> {
    pub status: &'a str,
    pub gateway_payment_id: Option<&'a str>,
    pub tracking: Option<&'a serde_json::Value>,
    pub notification_preferences: &'a serde_json::Value,
    pub revision: i32,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Transaction models
// ---------------------------------------------------------------------------

/// Row struct for reading from the transactions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub book_id: Uuid,
    pub amount_minor: i64,
    pub payment_status: String,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_id: Option<String>,
    pub carrier: Option<String>,
    pub shipment_status: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new transaction records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transactions)]
pub(crate) struct NewTransactionRow<'a> {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub book_id: Uuid,
    pub amount_minor: i64,
    pub payment_status: &'a str,
    pub gateway_order_id: &'a str,
    pub gateway_payment_id: Option<&'a str>,
    pub shipping_address: Option<&'a str>,
    pub tracking_id: Option<&'a str>,
    pub carrier: Option<&'a str>,
    pub shipment_status: &'a str,
    pub created_at: DateTime<Utc>,
}
