//! BookHive marketplace fulfillment service.
//!
//! Deals between readers, cart orders paid through Razorpay, shipment
//! tracking, and email and push notifications. The crate is laid out as
//! ports and adapters: [`domain`] owns the rules, [`inbound`] and
//! [`outbound`] translate to and from HTTP, WebSocket, Postgres, SMTP and
//! the payment gateway.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
