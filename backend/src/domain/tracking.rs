//! Shipment tracking embedded in an order.
//!
//! The ledger keeps an append-only history: every accepted carrier update
//! adds exactly one event at the end and refreshes the summary fields. No
//! entry is ever rewritten, reordered, deduplicated or dropped, so history
//! grows without bound for long-lived shipments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Order;

/// Carrier-reported shipment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
}

impl TrackingStatus {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unrecognised tracking statuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tracking status: {0}")]
pub struct UnknownTrackingStatus(pub String);

impl FromStr for TrackingStatus {
    type Err = UnknownTrackingStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "picked_up" => Ok(Self::PickedUp),
            "in_transit" => Ok(Self::InTransit),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            other => Err(UnknownTrackingStatus(other.to_owned())),
        }
    }
}

/// One entry in the shipment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub status: TrackingStatus,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Current shipment summary plus full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    pub carrier: String,
    pub tracking_number: String,
    pub status: TrackingStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub history: Vec<TrackingEvent>,
}

/// Carrier update as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingUpdate {
    pub carrier: String,
    pub tracking_number: String,
    pub status: TrackingStatus,
    pub location: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Append-only shipment history keeper.
pub struct TrackingLedger;

impl TrackingLedger {
    /// Append one event for `update` and overwrite the summary fields.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// # use marketplace::domain::{Order, TrackingLedger, TrackingStatus, TrackingUpdate};
    /// # fn demo(order: &mut Order) {
    /// let update = TrackingUpdate {
    ///     carrier: "Delhivery".into(),
    ///     tracking_number: "DL123".into(),
    ///     status: TrackingStatus::InTransit,
    ///     location: "Pune".into(),
    ///     estimated_delivery: None,
    /// };
    /// let event = TrackingLedger::append(order, update, Utc::now());
    /// assert_eq!(event.description, "Order in_transit at Pune");
    /// # }
    /// ```
    pub fn append(order: &mut Order, update: TrackingUpdate, at: DateTime<Utc>) -> TrackingEvent {
        let TrackingUpdate {
            carrier,
            tracking_number,
            status,
            location,
            estimated_delivery,
        } = update;

        let event = TrackingEvent {
            status,
            description: format!("Order {status} at {location}"),
            location,
            timestamp: at,
        };

        let slot = order.tracking_mut();
        let mut history = slot.take().map(|tracking| tracking.history).unwrap_or_default();
        history.push(event.clone());
        *slot = Some(Tracking {
            carrier,
            tracking_number,
            status,
            estimated_delivery,
            last_updated: at,
            history,
        });
        event
    }
}
