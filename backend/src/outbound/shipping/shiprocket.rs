//! Reqwest-backed Shiprocket adapter.
//!
//! Authenticates with a bearer token, quotes couriers, books ad hoc orders
//! and reads tracking scans. Carrier vocabulary is mapped onto
//! [`crate::domain::ShipmentStatus`] in the DTO layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{
    AdhocOrderDto, AdhocOrderResponseDto, ErrorDto, OrderItemDto, ServiceabilityDto,
    ServiceabilityParams, TrackingEnvelopeDto, money_to_rupees,
};
use crate::domain::ports::{
    BookedShipment, CourierOption, ServiceabilityQuery, ShipmentRequest, ShipmentTrack,
    ShippingCarrier, ShippingCarrierError,
};

const DEFAULT_BASE_URL: &str = "https://apiv2.shiprocket.in/v1/external/";
const USER_AGENT: &str = "bookhive-marketplace/0.1";
const PICKUP_LOCATION: &str = "Primary";
const BILLING_COUNTRY: &str = "India";
const PREPAID: &str = "Prepaid";

/// Shiprocket adapter bound to one API base URL.
pub struct ShiprocketCarrier {
    client: Client,
    serviceability_url: Url,
    orders_url: Url,
    tracking_url: Url,
    token: Zeroizing<String>,
}

impl ShiprocketCarrier {
    /// Build an adapter against the production API.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(token: Zeroizing<String>, timeout: Duration) -> Result<Self, ShiprocketError> {
        let base = Url::parse(DEFAULT_BASE_URL).map_err(ShiprocketError::Url)?;
        Self::with_base_url(base, token, timeout)
    }

    /// Build an adapter against `base_url`, for example a stub server.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built or the endpoint
    /// paths cannot be joined onto the URL.
    pub fn with_base_url(
        base_url: Url,
        token: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, ShiprocketError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ShiprocketError::Client)?;
        let join = |path: &str| base_url.join(path).map_err(ShiprocketError::Url);
        Ok(Self {
            client,
            serviceability_url: join("courier/serviceability")?,
            orders_url: join("orders/create/adhoc")?,
            tracking_url: join("tracking/shipment/")?,
            token,
        })
    }

    fn shipment_url(&self, tracking_id: &str) -> Result<Url, ShippingCarrierError> {
        let mut url = self.tracking_url.clone();
        url.path_segments_mut()
            .map_err(|()| ShippingCarrierError::transport("tracking URL cannot take a path"))?
            .pop_if_empty()
            .push(tracking_id);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ShippingCarrierError> {
        let response = request
            .bearer_auth(self.token.as_str())
            .send()
            .await
            .map_err(|err| ShippingCarrierError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ShippingCarrierError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        decode(body.as_ref())
    }
}

/// Construction failures for [`ShiprocketCarrier`].
#[derive(Debug, thiserror::Error)]
pub enum ShiprocketError {
    #[error("invalid Shiprocket URL: {0}")]
    Url(url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

#[async_trait]
impl ShippingCarrier for ShiprocketCarrier {
    async fn serviceability(
        &self,
        query: ServiceabilityQuery,
    ) -> Result<Vec<CourierOption>, ShippingCarrierError> {
        let params = ServiceabilityParams {
            pickup_postcode: &query.pickup_postcode,
            delivery_postcode: &query.delivery_postcode,
            weight: query.weight_kg,
            cod: 0,
        };
        let request = self
            .client
            .get(self.serviceability_url.clone())
            .query(&params);
        let decoded: ServiceabilityDto = self.send(request).await?;
        let options = decoded
            .into_domain()
            .map_err(ShippingCarrierError::decode)?;
        debug!(
            pickup = %query.pickup_postcode,
            delivery = %query.delivery_postcode,
            couriers = options.len(),
            "courier serviceability fetched"
        );
        Ok(options)
    }

    async fn create_shipment(
        &self,
        request: ShipmentRequest,
    ) -> Result<BookedShipment, ShippingCarrierError> {
        let price = money_to_rupees(request.item_price);
        let destination = &request.destination;
        let payload = AdhocOrderDto {
            order_id: request.reference.to_string(),
            order_date: request.ordered_at.format("%Y-%m-%d %H:%M").to_string(),
            pickup_location: PICKUP_LOCATION,
            billing_customer_name: &request.customer_name,
            billing_address: &destination.address,
            billing_city: &destination.city,
            billing_pincode: &destination.pincode,
            billing_state: &destination.state,
            billing_country: BILLING_COUNTRY,
            billing_email: &request.customer_email,
            billing_phone: &destination.phone,
            shipping_is_billing: true,
            order_items: vec![OrderItemDto {
                name: &request.item_name,
                sku: &request.item_sku,
                units: 1,
                selling_price: price.clone(),
            }],
            payment_method: PREPAID,
            sub_total: price,
        };
        let call = self.client.post(self.orders_url.clone()).json(&payload);
        let decoded: AdhocOrderResponseDto = self.send(call).await?;
        let booked = decoded
            .into_domain()
            .map_err(ShippingCarrierError::decode)?;
        debug!(
            reference = %request.reference,
            tracking_id = %booked.tracking_id,
            "shipment booked"
        );
        Ok(booked)
    }

    async fn track(&self, tracking_id: &str) -> Result<ShipmentTrack, ShippingCarrierError> {
        let url = self.shipment_url(tracking_id)?;
        let decoded: TrackingEnvelopeDto = self.send(self.client.get(url)).await?;
        Ok(decoded.into_domain(tracking_id))
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ShippingCarrierError> {
    serde_json::from_slice(body).map_err(|error| {
        ShippingCarrierError::decode(format!("invalid Shiprocket payload: {error}"))
    })
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ShippingCarrierError {
    let message = serde_json::from_slice::<ErrorDto>(body)
        .ok()
        .and_then(|error| error.message)
        .unwrap_or_else(|| format!("status {}", status.as_u16()));
    ShippingCarrierError::rejected(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Money, ShipmentStatus};
    use crate::outbound::shipping::dto::{rupees_to_money, shipment_status_from_carrier};
    use rstest::rstest;

    fn carrier(base: &str) -> ShiprocketCarrier {
        let base = Url::parse(base).expect("url");
        ShiprocketCarrier::with_base_url(
            base,
            Zeroizing::new("token".to_owned()),
            Duration::from_secs(1),
        )
        .expect("carrier builds")
    }

    #[rstest]
    fn parses_courier_companies() {
        let body = br#"{"status":200,"data":{"available_courier_companies":[
            {"courier_name":"Delhivery","rate":85.5,"estimated_delivery_days":"4"},
            {"courier_name":"Xpressbees","rate":"72","estimated_delivery_days":3},
            {"courier_name":"Ekart","rate":90,"estimated_delivery_days":""}
        ]}}"#;

        let decoded: ServiceabilityDto = decode(body).expect("payload decodes");
        let options = decoded.into_domain().expect("options map");

        assert_eq!(options.len(), 3);
        let rates: Vec<_> = options.iter().map(|option| option.rate).collect();
        assert_eq!(
            rates,
            vec![
                Money::from_minor(8_550).expect("rate"),
                Money::from_major(72),
                Money::from_major(90),
            ]
        );
        let days: Vec<_> = options
            .iter()
            .map(|option| option.estimated_delivery_days)
            .collect();
        assert_eq!(days, vec![Some(4), Some(3), None]);
    }

    #[rstest]
    fn missing_courier_data_means_no_options() {
        let decoded: ServiceabilityDto =
            decode(br#"{"status":404,"message":"no couriers"}"#).expect("payload decodes");
        assert_eq!(decoded.into_domain().expect("options map"), Vec::new());
    }

    #[rstest]
    fn courier_without_rate_is_rejected() {
        let decoded: ServiceabilityDto = decode(
            br#"{"data":{"available_courier_companies":[{"courier_name":"Ghost"}]}}"#,
        )
        .expect("payload decodes");
        assert!(decoded.into_domain().is_err());
    }

    #[rstest]
    #[case("85.5", Some(8_550))]
    #[case("85.50", Some(8_550))]
    #[case("85", Some(8_500))]
    #[case("85.567", Some(8_556))]
    #[case(" 12.05 ", Some(1_205))]
    #[case("-3", None)]
    #[case("abc", None)]
    #[case(".5", None)]
    #[case("1e3", None)]
    fn rupee_text_converts_to_paise(#[case] text: &str, #[case] expected: Option<i64>) {
        assert_eq!(rupees_to_money(text).map(Money::minor_units), expected);
    }

    #[rstest]
    fn booking_response_yields_tracking_id() {
        let decoded: AdhocOrderResponseDto =
            decode(br#"{"order_id":901,"shipment_id":77123,"status":"NEW","courier_name":""}"#)
                .expect("payload decodes");
        let booked = decoded.into_domain().expect("booking maps");
        assert_eq!(booked.tracking_id, "77123");
        assert_eq!(booked.carrier, None);
    }

    #[rstest]
    fn booking_without_shipment_id_is_rejected() {
        let decoded: AdhocOrderResponseDto =
            decode(br#"{"order_id":901,"status":"NEW"}"#).expect("payload decodes");
        assert!(decoded.into_domain().is_err());
    }

    #[rstest]
    #[case("Delivered", Some(ShipmentStatus::Delivered))]
    #[case("IN TRANSIT", Some(ShipmentStatus::Shipped))]
    #[case("Out For Delivery", Some(ShipmentStatus::Shipped))]
    #[case("Picked Up", Some(ShipmentStatus::Shipped))]
    #[case("Shipped", Some(ShipmentStatus::Shipped))]
    #[case("Undelivered", None)]
    #[case("RTO Delivered", None)]
    #[case("Pickup Scheduled", None)]
    fn carrier_status_maps_onto_lifecycle(
        #[case] text: &str,
        #[case] expected: Option<ShipmentStatus>,
    ) {
        assert_eq!(shipment_status_from_carrier(text), expected);
    }

    #[rstest]
    fn tracking_payload_collects_scans() {
        let body = br#"{"tracking_data":{
            "track_status":1,
            "shipment_track":[{"current_status":"In Transit"}],
            "shipment_track_activities":[
                {"date":"2024-03-02 10:00:00","activity":"Reached hub","location":"Pune"},
                {"date":"2024-03-01 18:00:00","activity":"Picked up"}
            ]
        }}"#;

        let decoded: TrackingEnvelopeDto = decode(body).expect("payload decodes");
        let track = decoded.into_domain("77123");

        assert_eq!(track.tracking_id, "77123");
        assert_eq!(track.carrier_status.as_deref(), Some("In Transit"));
        assert_eq!(track.status, Some(ShipmentStatus::Shipped));
        assert_eq!(track.activities.len(), 2);
        assert_eq!(
            track.activities.first().and_then(|scan| scan.location.as_deref()),
            Some("Pune")
        );
    }

    #[rstest]
    fn status_errors_carry_carrier_message() {
        let error = map_status_error(StatusCode::UNAUTHORIZED, br#"{"message":"Token expired"}"#);
        assert_eq!(error, ShippingCarrierError::rejected(401_u16, "Token expired"));
    }

    #[rstest]
    fn status_errors_without_body_report_the_status() {
        let error = map_status_error(StatusCode::BAD_GATEWAY, b"");
        assert_eq!(error, ShippingCarrierError::rejected(502_u16, "status 502"));
    }

    #[rstest]
    fn endpoints_keep_version_prefix() {
        let adapter = carrier("http://127.0.0.1:9/v1/external/");
        assert_eq!(
            adapter.serviceability_url.as_str(),
            "http://127.0.0.1:9/v1/external/courier/serviceability"
        );
        assert_eq!(
            adapter.orders_url.as_str(),
            "http://127.0.0.1:9/v1/external/orders/create/adhoc"
        );
        assert_eq!(
            adapter.shipment_url("SR 7/1").expect("url").as_str(),
            "http://127.0.0.1:9/v1/external/tracking/shipment/SR%207%2F1"
        );
    }

    #[rstest]
    fn selling_price_is_sent_in_rupees() {
        assert_eq!(
            money_to_rupees(Money::from_minor(29_950).expect("amount")),
            "299.50"
        );
    }
}
