//! Fulfillment core: aggregates, services and ports.
//!
//! Purpose: own the deal and order lifecycles, payment verification, the
//! shipment ledger and notification fan-out. Nothing here imports web or
//! database crates; adapters live in `inbound` and `outbound`.
//!
//! Public surface:
//! - Aggregates: [`Deal`], [`Order`], [`Transaction`] and their value types.
//! - Services: [`DealNegotiator`], [`OrderFulfillment`], [`CheckoutService`],
//!   [`PaymentVerifier`], [`TrackingLedger`], [`NotificationDispatcher`].
//! - [`Error`] with its [`ErrorCode`] and [`FailureReason`].

pub mod checkout_service;
pub mod deal;
pub mod deal_service;
pub mod error;
pub mod ids;
pub mod listing;
pub mod money;
pub mod notification;
pub mod order;
pub mod order_service;
pub mod payment;
pub mod ports;
pub mod tracking;
pub mod trace_id;
pub mod transaction;

pub use self::checkout_service::CheckoutService;
pub use self::deal::{
    Deal, DealError, DealRecord, DealStatus, DealView, HandoffMethod, NewDeal, Rating, Stars,
};
pub use self::deal_service::DealNegotiator;
pub use self::error::{Error, ErrorCode, ErrorValidationError, FailureReason};
pub use self::ids::{
    AddressId, BookId, DealId, IdentifierError, OrderId, TransactionId, UserId,
};
pub use self::listing::{BookListing, UserProfile};
pub use self::money::{CURRENCY, Money};
pub use self::notification::{Delivery, LineItem, NotificationDispatcher};
pub use self::order::{
    NewOrder, NotificationPreferences, Order, OrderError, OrderItem, OrderRecord, OrderStatus,
    PaymentMethod, ShippingAddress, order_total,
};
pub use self::order_service::OrderFulfillment;
pub use self::payment::{PaymentSecret, PaymentVerifier};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::tracking::{
    Tracking, TrackingEvent, TrackingLedger, TrackingStatus, TrackingUpdate,
    UnknownTrackingStatus,
};
pub use self::transaction::{
    PaymentStatus, ShipmentStatus, ShippingDetails, Transaction, TransactionError,
    TransactionRecord,
};
