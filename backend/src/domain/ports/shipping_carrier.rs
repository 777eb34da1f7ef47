//! Port for the courier aggregator that books and tracks parcels.
//!
//! Single-book purchases ship through an external aggregator: it quotes
//! couriers for a route, books a shipment and reports its progress. Carrier
//! vocabulary is translated into [`ShipmentStatus`] by the adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Money, ShipmentStatus, TransactionId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by shipping carrier adapters.
    pub enum ShippingCarrierError {
        /// The request never produced a response.
        Transport { message: String } =>
            "shipping carrier unreachable: {message}",
        /// The carrier answered with a non-success status.
        Rejected { status: u16, message: String } =>
            "shipping carrier rejected request ({status}): {message}",
        /// The carrier's response could not be decoded.
        Decode { message: String } =>
            "shipping carrier response invalid: {message}",
    }
}

/// Route and parcel weight to quote couriers for.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceabilityQuery {
    pub pickup_postcode: String,
    pub delivery_postcode: String,
    /// Parcel weight in kilograms.
    pub weight_kg: f64,
}

/// One courier able to serve a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierOption {
    pub courier_name: String,
    /// Quoted price in paise.
    pub rate: Money,
    pub estimated_delivery_days: Option<u32>,
}

/// Delivery address supplied when booking a shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentDestination {
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub state: String,
    pub phone: String,
}

/// Everything the carrier needs to book one parcel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRequest {
    /// Merchant-side order reference.
    pub reference: TransactionId,
    pub ordered_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub destination: ShipmentDestination,
    pub item_name: String,
    pub item_sku: String,
    pub item_price: Money,
}

/// Booking handle returned by the carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedShipment {
    pub tracking_id: String,
    /// Assigned courier, when the carrier names one at booking time.
    pub carrier: Option<String>,
}

/// One scan reported by the courier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentActivity {
    pub activity: String,
    pub location: Option<String>,
    /// Carrier-formatted timestamp, passed through untouched.
    pub at: Option<String>,
}

/// Carrier view of a shipment's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentTrack {
    pub tracking_id: String,
    /// Raw carrier status text.
    pub carrier_status: Option<String>,
    /// Carrier status mapped onto the shipment lifecycle, when recognised.
    pub status: Option<ShipmentStatus>,
    pub activities: Vec<ShipmentActivity>,
}

/// Quotes, books and tracks courier shipments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShippingCarrier: Send + Sync {
    /// Couriers able to serve the route, in the carrier's order.
    async fn serviceability(
        &self,
        query: ServiceabilityQuery,
    ) -> Result<Vec<CourierOption>, ShippingCarrierError>;

    /// Book a parcel for pickup.
    async fn create_shipment(
        &self,
        request: ShipmentRequest,
    ) -> Result<BookedShipment, ShippingCarrierError>;

    /// Current progress of a booked parcel.
    async fn track(&self, tracking_id: &str) -> Result<ShipmentTrack, ShippingCarrierError>;
}

/// Fixture carrier with no couriers that books under the reference id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureShippingCarrier;

#[async_trait]
impl ShippingCarrier for FixtureShippingCarrier {
    async fn serviceability(
        &self,
        _query: ServiceabilityQuery,
    ) -> Result<Vec<CourierOption>, ShippingCarrierError> {
        Ok(Vec::new())
    }

    async fn create_shipment(
        &self,
        request: ShipmentRequest,
    ) -> Result<BookedShipment, ShippingCarrierError> {
        Ok(BookedShipment {
            tracking_id: format!("ship_{}", request.reference),
            carrier: None,
        })
    }

    async fn track(&self, tracking_id: &str) -> Result<ShipmentTrack, ShippingCarrierError> {
        Ok(ShipmentTrack {
            tracking_id: tracking_id.to_owned(),
            carrier_status: None,
            status: None,
            activities: Vec::new(),
        })
    }
}
