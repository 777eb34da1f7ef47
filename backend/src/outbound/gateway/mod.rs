//! Payment gateway outbound adapters.
//!
//! A thin HTTP implementation of the `PaymentGateway` port for Razorpay.

mod dto;
mod razorpay;

pub use razorpay::{RazorpayCredentials, RazorpayError, RazorpayGateway};
