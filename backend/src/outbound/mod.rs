//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories and lookups using Diesel
//! - **gateway**: Razorpay order creation over HTTPS
//! - **mail**: transactional email over SMTP
//! - **push**: in-process registry of live WebSocket connections
//! - **shipping**: Shiprocket courier quotes, bookings and tracking
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod gateway;
pub mod mail;
pub mod persistence;
pub mod push;
pub mod shipping;
