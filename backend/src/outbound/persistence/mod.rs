//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the driven ports backed by PostgreSQL via
//! `diesel-async` with `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Business rules stay in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Atomic writes**: deal creation, order updates and payment settlement
//!   are each a single conditional statement, so concurrent requests resolve
//!   in the database rather than in process memory.
//!
//! # Example
//!
//! ```ignore
//! use marketplace::outbound::persistence::{DbPool, DieselOrderRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/marketplace")).await?;
//! let orders = DieselOrderRepository::new(pool);
//! ```

mod diesel_deal_repository;
mod diesel_error_mapping;
mod diesel_marketplace_lookups;
mod diesel_order_repository;
mod diesel_transaction_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_deal_repository::DieselDealRepository;
pub use diesel_marketplace_lookups::{
    DieselAddressBook, DieselBookCatalogue, DieselCartStore, DieselChatPurger, DieselUserDirectory,
};
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_transaction_repository::DieselTransactionRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
