//! DTOs for Shiprocket's external API.
//!
//! Shiprocket reports numbers inconsistently (a rate may arrive as `85.5` or
//! `"85.50"`, a shipment id as `123` or `"123"`), so loosely typed fields are
//! kept as raw JSON and normalised here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ports::{BookedShipment, CourierOption, ShipmentActivity, ShipmentTrack};
use crate::domain::{Money, ShipmentStatus};

const PAISE_PER_RUPEE: i64 = 100;

#[derive(Debug, Serialize)]
pub(super) struct ServiceabilityParams<'a> {
    pub(super) pickup_postcode: &'a str,
    pub(super) delivery_postcode: &'a str,
    pub(super) weight: f64,
    pub(super) cod: u8,
}

#[derive(Debug, Deserialize)]
pub(super) struct ServiceabilityDto {
    #[serde(default)]
    pub(super) data: Option<ServiceabilityDataDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ServiceabilityDataDto {
    #[serde(default)]
    pub(super) available_courier_companies: Vec<CourierCompanyDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CourierCompanyDto {
    pub(super) courier_name: String,
    #[serde(default)]
    pub(super) rate: Option<Value>,
    #[serde(default)]
    pub(super) estimated_delivery_days: Option<Value>,
}

impl ServiceabilityDto {
    pub(super) fn into_domain(self) -> Result<Vec<CourierOption>, String> {
        self.data
            .map(|data| data.available_courier_companies)
            .unwrap_or_default()
            .into_iter()
            .map(CourierCompanyDto::into_domain)
            .collect()
    }
}

impl CourierCompanyDto {
    fn into_domain(self) -> Result<CourierOption, String> {
        let rate_text = self
            .rate
            .as_ref()
            .and_then(loose_text)
            .ok_or_else(|| format!("courier {} reported no rate", self.courier_name))?;
        let rate = rupees_to_money(&rate_text)
            .ok_or_else(|| format!("courier {} reported rate {rate_text}", self.courier_name))?;
        let estimated_delivery_days = self
            .estimated_delivery_days
            .as_ref()
            .and_then(loose_text)
            .and_then(|days| days.parse().ok());
        Ok(CourierOption {
            courier_name: self.courier_name,
            rate,
            estimated_delivery_days,
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AdhocOrderDto<'a> {
    pub(super) order_id: String,
    pub(super) order_date: String,
    pub(super) pickup_location: &'static str,
    pub(super) billing_customer_name: &'a str,
    pub(super) billing_address: &'a str,
    pub(super) billing_city: &'a str,
    pub(super) billing_pincode: &'a str,
    pub(super) billing_state: &'a str,
    pub(super) billing_country: &'static str,
    pub(super) billing_email: &'a str,
    pub(super) billing_phone: &'a str,
    pub(super) shipping_is_billing: bool,
    pub(super) order_items: Vec<OrderItemDto<'a>>,
    pub(super) payment_method: &'static str,
    pub(super) sub_total: String,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderItemDto<'a> {
    pub(super) name: &'a str,
    pub(super) sku: &'a str,
    pub(super) units: u32,
    pub(super) selling_price: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AdhocOrderResponseDto {
    #[serde(default)]
    pub(super) shipment_id: Option<Value>,
    #[serde(default)]
    pub(super) courier_name: Option<String>,
}

impl AdhocOrderResponseDto {
    pub(super) fn into_domain(self) -> Result<BookedShipment, String> {
        let tracking_id = self
            .shipment_id
            .as_ref()
            .and_then(loose_text)
            .ok_or_else(|| "shipment id missing".to_owned())?;
        Ok(BookedShipment {
            tracking_id,
            carrier: self.courier_name.filter(|name| !name.trim().is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackingEnvelopeDto {
    #[serde(default)]
    pub(super) tracking_data: Option<TrackingDataDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackingDataDto {
    #[serde(default)]
    pub(super) shipment_track: Vec<ShipmentTrackDto>,
    #[serde(default)]
    pub(super) shipment_track_activities: Option<Vec<TrackActivityDto>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ShipmentTrackDto {
    #[serde(default)]
    pub(super) current_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackActivityDto {
    #[serde(default)]
    pub(super) date: Option<String>,
    #[serde(default)]
    pub(super) activity: Option<String>,
    #[serde(default)]
    pub(super) location: Option<String>,
}

impl TrackingEnvelopeDto {
    pub(super) fn into_domain(self, tracking_id: &str) -> ShipmentTrack {
        let data = self.tracking_data;
        let carrier_status = data
            .as_ref()
            .and_then(|tracking| tracking.shipment_track.first())
            .and_then(|track| track.current_status.clone())
            .filter(|status| !status.trim().is_empty());
        let activities = data
            .and_then(|tracking| tracking.shipment_track_activities)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|scan| {
                scan.activity.map(|activity| ShipmentActivity {
                    activity,
                    location: scan.location,
                    at: scan.date,
                })
            })
            .collect();
        ShipmentTrack {
            tracking_id: tracking_id.to_owned(),
            status: carrier_status.as_deref().and_then(shipment_status_from_carrier),
            carrier_status,
            activities,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDto {
    #[serde(default)]
    pub(super) message: Option<String>,
}

/// Map Shiprocket's free-text status onto the shipment lifecycle.
pub(super) fn shipment_status_from_carrier(status: &str) -> Option<ShipmentStatus> {
    let normalised = status.trim().to_ascii_lowercase();
    if normalised.contains("undelivered") || normalised.contains("rto") {
        return None;
    }
    if normalised.contains("delivered") && !normalised.contains("out for delivery") {
        return Some(ShipmentStatus::Delivered);
    }
    ["shipped", "in transit", "picked up", "out for delivery"]
        .iter()
        .any(|marker| normalised.contains(marker))
        .then_some(ShipmentStatus::Shipped)
}

/// Render paise as a plain rupee amount, e.g. `299.50`.
#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "splitting paise into rupees and paise for the carrier payload"
)]
pub(super) fn money_to_rupees(amount: Money) -> String {
    let paise = amount.minor_units();
    format!("{}.{:02}", paise / PAISE_PER_RUPEE, paise % PAISE_PER_RUPEE)
}

/// Parse a decimal rupee amount into paise, truncating beyond two places.
pub(super) fn rupees_to_money(text: &str) -> Option<Money> {
    let (whole, fraction) = text.trim().split_once('.').unwrap_or((text.trim(), ""));
    if whole.is_empty() || !whole.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if !fraction.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let rupees: i64 = whole.parse().ok()?;
    let paise = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(2)
        .try_fold(0_i64, |acc, digit| {
            acc.checked_mul(10)?.checked_add(i64::from(digit - b'0'))
        })?;
    Money::from_minor(rupees.checked_mul(PAISE_PER_RUPEE)?.checked_add(paise)?)
}

fn loose_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        _ => None,
    }
}
