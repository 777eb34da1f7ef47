//! DTOs for Razorpay's orders API.

use serde::{Deserialize, Serialize};

use crate::domain::Money;
use crate::domain::ports::GatewayOrder;

#[derive(Debug, Serialize)]
pub(super) struct CreateOrderDto<'a> {
    pub(super) amount: i64,
    pub(super) currency: &'a str,
    pub(super) receipt: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderDto {
    pub(super) id: String,
    pub(super) amount: i64,
    pub(super) currency: String,
}

impl OrderDto {
    pub(super) fn into_domain(self) -> Result<GatewayOrder, String> {
        let amount = Money::from_minor(self.amount)
            .ok_or_else(|| format!("order {} reported a negative amount", self.id))?;
        if self.id.is_empty() {
            return Err("order id missing".to_owned());
        }
        Ok(GatewayOrder {
            id: self.id,
            amount,
            currency: self.currency,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDto {
    #[serde(default)]
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) description: Option<String>,
}
