//! Courier aggregator outbound adapters.
//!
//! A thin HTTP implementation of the `ShippingCarrier` port for Shiprocket.

mod dto;
mod shiprocket;

pub use shiprocket::{ShiprocketCarrier, ShiprocketError};
